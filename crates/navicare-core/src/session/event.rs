//! Inputs to the reducer: user actions and results of earlier effects.

use crate::locale::Language;
use crate::types::{Provider, TriageTurn};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User actions
    Start,
    SelectLanguage(Language),
    SubmitText {
        text: String,
        at: DateTime<Utc>,
    },
    SetSearchInputs {
        zip_code: String,
        insurance: String,
    },
    SearchProviders,
    ToggleListening,
    ReadAloud {
        index: usize,
    },
    Reset,

    // Gateway results. `None` means the call failed.
    GreetingReady {
        token: u64,
        greeting: Option<String>,
        at: DateTime<Utc>,
    },
    TriageReplied {
        token: u64,
        reply: Option<TriageTurn>,
        at: DateTime<Utc>,
    },
    ProvidersFound {
        token: u64,
        providers: Vec<Provider>,
    },

    // Speech devices
    Transcript {
        text: String,
        at: DateTime<Utc>,
    },
    CaptureFailed {
        reason: String,
    },
    CaptureEnded,
    SpeechFinished,
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::SubmitText {
            text: text.into(),
            at: Utc::now(),
        }
    }
}
