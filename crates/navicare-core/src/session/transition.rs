//! Pure state transitions.

use super::effect::Effect;
use super::event::Event;
use super::state::{Phase, RequestKind, SessionState};
use crate::error::SessionError;
use crate::prompts::{FOLLOW_UP_FALLBACK, GREETING_FALLBACK, TECHNICAL_ISSUE_MESSAGE};
use crate::types::{Message, ProviderQuery, TriageLevel, TriageTurn};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Apply `event` to `state`. A refused action returns `Err` and leaves the
/// caller's state untouched; stale gateway replies are accepted as no-ops.
pub fn transition(state: &SessionState, event: Event) -> Result<Transition, SessionError> {
    match event {
        Event::Start => start(state),
        Event::SelectLanguage(language) => {
            let mut next = state.clone();
            next.language = language;
            Ok(Transition::new(next))
        }
        Event::SubmitText { text, at } | Event::Transcript { text, at } => submit(state, &text, at),
        Event::SetSearchInputs { zip_code, insurance } => {
            let mut next = state.clone();
            next.zip_code = zip_code.trim().to_string();
            next.insurance = insurance.trim().to_string();
            Ok(Transition::new(next))
        }
        Event::SearchProviders => search(state),
        Event::ToggleListening => toggle_listening(state),
        Event::ReadAloud { index } => read_aloud(state, index),
        Event::Reset => Ok(reset(state)),

        Event::GreetingReady { token, greeting, at } => {
            let mut next = state.clone();
            if !next.settle_token(token, RequestKind::Greeting) {
                return Ok(Transition::new(state.clone()));
            }
            let text = greeting.unwrap_or_else(|| GREETING_FALLBACK.to_string());
            next.messages.push(Message::model(text, at));
            Ok(Transition::new(next))
        }
        Event::TriageReplied { token, reply, at } => {
            let mut next = state.clone();
            if !next.settle_token(token, RequestKind::Triage) {
                return Ok(Transition::new(state.clone()));
            }
            Ok(apply_triage_reply(next, reply, at))
        }
        Event::ProvidersFound { token, providers } => {
            let mut next = state.clone();
            if !next.settle_token(token, RequestKind::Providers) {
                return Ok(Transition::new(state.clone()));
            }
            next.providers = providers;
            next.searched = true;
            Ok(Transition::new(next))
        }

        Event::CaptureFailed { .. } | Event::CaptureEnded => {
            let mut next = state.clone();
            next.listening = false;
            Ok(Transition::new(next))
        }
        Event::SpeechFinished => {
            let mut next = state.clone();
            next.speaking = false;
            Ok(Transition::new(next))
        }
    }
}

fn start(state: &SessionState) -> Result<Transition, SessionError> {
    if state.phase != Phase::Consent {
        return Err(SessionError::AlreadyStarted);
    }
    let mut next = state.clone();
    next.phase = Phase::Conversing;
    let token = next.issue_token(RequestKind::Greeting);
    let language = next.language;
    Ok(Transition::new(next).with_effect(Effect::RequestGreeting { token, language }))
}

fn submit(state: &SessionState, text: &str, at: DateTime<Utc>) -> Result<Transition, SessionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SessionError::EmptyInput);
    }
    if state.phase != Phase::Conversing {
        return Err(SessionError::NotConversing);
    }
    if state.in_flight.is_some() {
        return Err(SessionError::RequestInFlight);
    }

    let mut next = state.clone();
    next.messages.push(Message::user(text, at));
    let token = next.issue_token(RequestKind::Triage);
    let effect = Effect::RequestTriage {
        token,
        history: next.messages.clone(),
        language: next.language,
    };
    Ok(Transition::new(next).with_effect(effect))
}

fn apply_triage_reply(mut next: SessionState, reply: Option<TriageTurn>, at: DateTime<Utc>) -> Transition {
    let Some(turn) = reply else {
        next.messages.push(Message::model(TECHNICAL_ISSUE_MESSAGE, at));
        return Transition::new(next);
    };

    if let Some(result) = turn.resolved() {
        let result = result.clone();
        if result.level == TriageLevel::Emergency {
            next.emergency_escalated = true;
        }
        if !result.recommendation.trim().is_empty() {
            next.messages.push(Message::model(result.recommendation.trim(), at));
        }
        next.triage = Some(result);
        next.phase = Phase::Resolved;

        if next.listening {
            next.listening = false;
            return Transition::new(next).with_effect(Effect::StopCapture);
        }
        return Transition::new(next);
    }

    let question = turn
        .next_question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(FOLLOW_UP_FALLBACK);
    next.messages.push(Message::model(question, at));
    Transition::new(next)
}

fn search(state: &SessionState) -> Result<Transition, SessionError> {
    if !state.can_search_providers() {
        return Err(SessionError::SearchUnavailable);
    }
    if state.zip_code.trim().is_empty() {
        return Err(SessionError::MissingZipCode);
    }
    if state.in_flight.is_some() {
        return Err(SessionError::RequestInFlight);
    }
    let specialty = state
        .triage
        .as_ref()
        .and_then(|t| t.specialty())
        .map(str::to_string)
        .ok_or(SessionError::SearchUnavailable)?;

    let mut next = state.clone();
    let query = ProviderQuery {
        specialty,
        zip_code: next.zip_code.clone(),
        insurance: next.insurance_filter(),
        language: next.language.code.to_string(),
    };
    let token = next.issue_token(RequestKind::Providers);
    Ok(Transition::new(next).with_effect(Effect::RequestProviders { token, query }))
}

fn toggle_listening(state: &SessionState) -> Result<Transition, SessionError> {
    let mut next = state.clone();
    if state.listening {
        next.listening = false;
        return Ok(Transition::new(next).with_effect(Effect::StopCapture));
    }
    if state.phase != Phase::Conversing {
        return Err(SessionError::NotConversing);
    }
    if state.in_flight.is_some() {
        return Err(SessionError::RequestInFlight);
    }
    next.listening = true;
    let language = next.language.code.to_string();
    Ok(Transition::new(next).with_effect(Effect::StartCapture { language }))
}

fn read_aloud(state: &SessionState, index: usize) -> Result<Transition, SessionError> {
    if state.speaking {
        return Err(SessionError::SpeechBusy);
    }
    let text = state.model_message(index)?.text.clone();
    let mut next = state.clone();
    next.speaking = true;
    let voice = next.language.voice.to_string();
    Ok(Transition::new(next).with_effect(Effect::Speak { text, voice }))
}

/// Back to consent. Language and the token counter survive so late replies stay stale.
fn reset(state: &SessionState) -> Transition {
    let mut next = SessionState::new(state.language);
    next.next_token = state.next_token;
    Transition::new(next)
        .with_effect(Effect::CancelCapture)
        .with_effect(Effect::CancelRequest)
        .with_effect(Effect::ReleaseAudio)
}
