use crate::locale::Language;
use crate::types::{Message, ProviderQuery};

use super::state::RequestToken;

/// Side effects requested by a transition, executed by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RequestGreeting {
        token: RequestToken,
        language: Language,
    },
    RequestTriage {
        token: RequestToken,
        history: Vec<Message>,
        language: Language,
    },
    RequestProviders {
        token: RequestToken,
        query: ProviderQuery,
    },
    StartCapture {
        language: String,
    },
    StopCapture,
    /// Stop and discard any pending transcript.
    CancelCapture,
    Speak {
        text: String,
        voice: String,
    },
    /// Abort the outstanding gateway call.
    CancelRequest,
    /// Stop playback and close the output device; awaited.
    ReleaseAudio,
}
