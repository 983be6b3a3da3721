//! Error types for the gateway, the provider directory and session actions.

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures talking to the reasoning service. None of these reach the user:
/// the gateway and session turn them into fixed fallback values.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Reasoning service request failed: {0}")]
    Transport(String),

    #[error("Reasoning service error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Reasoning service returned no content")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Malformed(err.to_string())
    }
}

/// Failures persisting saved providers.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Provider store error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Provider serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A user action the session refused. Refusals never change session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A request is already in flight")]
    RequestInFlight,

    #[error("Assessment has already started")]
    AlreadyStarted,

    #[error("Conversation input is closed")]
    NotConversing,

    #[error("Provider search is not available for this assessment")]
    SearchUnavailable,

    #[error("ZIP code is required")]
    MissingZipCode,

    #[error("Speech is already playing")]
    SpeechBusy,

    #[error("No assistant message at index {0}")]
    NoSuchMessage(usize),

    #[error("No provider at index {0}")]
    NoSuchProvider(usize),
}
