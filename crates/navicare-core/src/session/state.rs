//! Session aggregate.

use crate::error::SessionError;
use crate::locale::Language;
use crate::prompts::EMERGENCY_NOTICE;
use crate::types::{Message, Provider, Role, TriageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Disclaimer shown, language being chosen.
    Consent,
    /// Intake dialogue open.
    Conversing,
    /// Triage result set; only provider search, read-aloud and reset remain.
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Greeting,
    Triage,
    Providers,
}

/// Identifies the one outstanding gateway call. Replies carrying any other id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub id: u64,
    pub kind: RequestKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceActivity {
    Idle,
    Listening,
    Speaking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub language: Language,
    /// Append-only conversation, in order.
    pub messages: Vec<Message>,
    pub triage: Option<TriageResult>,
    /// Set when a result is EMERGENCY; cleared only by reset.
    pub emergency_escalated: bool,
    pub providers: Vec<Provider>,
    /// True once a search has returned, even with no results.
    pub searched: bool,
    pub zip_code: String,
    /// Blank means no insurance filter.
    pub insurance: String,
    pub in_flight: Option<RequestToken>,
    pub listening: bool,
    pub speaking: bool,
    pub(crate) next_token: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl SessionState {
    pub fn new(language: Language) -> Self {
        Self {
            phase: Phase::Consent,
            language,
            messages: Vec::new(),
            triage: None,
            emergency_escalated: false,
            providers: Vec::new(),
            searched: false,
            zip_code: String::new(),
            insurance: String::new(),
            in_flight: None,
            listening: false,
            speaking: false,
            next_token: 1,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Free-text input is accepted.
    pub fn can_send(&self) -> bool {
        self.phase == Phase::Conversing && self.in_flight.is_none()
    }

    /// The resolved level calls for a directory search and names a specialty.
    pub fn can_search_providers(&self) -> bool {
        self.phase == Phase::Resolved
            && self
                .triage
                .as_ref()
                .is_some_and(|t| t.level.needs_directory() && t.specialty().is_some())
    }

    pub fn emergency_notice(&self) -> Option<&'static str> {
        self.emergency_escalated.then_some(EMERGENCY_NOTICE)
    }

    pub fn voice_activity(&self) -> VoiceActivity {
        if self.speaking {
            VoiceActivity::Speaking
        } else if self.listening {
            VoiceActivity::Listening
        } else {
            VoiceActivity::Idle
        }
    }

    /// Model message at `index`, for read-aloud.
    pub fn model_message(&self, index: usize) -> Result<&Message, SessionError> {
        self.messages
            .get(index)
            .filter(|m| m.role == Role::Model)
            .ok_or(SessionError::NoSuchMessage(index))
    }

    pub fn provider(&self, index: usize) -> Result<&Provider, SessionError> {
        self.providers
            .get(index)
            .ok_or(SessionError::NoSuchProvider(index))
    }

    /// Insurance filter, if one was entered.
    pub fn insurance_filter(&self) -> Option<String> {
        let insurance = self.insurance.trim();
        (!insurance.is_empty()).then(|| insurance.to_string())
    }

    pub(crate) fn issue_token(&mut self, kind: RequestKind) -> RequestToken {
        let token = RequestToken {
            id: self.next_token,
            kind,
        };
        self.next_token += 1;
        self.in_flight = Some(token);
        token
    }

    /// Clears the in-flight slot if `id` is the outstanding request of `kind`.
    pub(crate) fn settle_token(&mut self, id: u64, kind: RequestKind) -> bool {
        match self.in_flight {
            Some(token) if token.id == id && token.kind == kind => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}
