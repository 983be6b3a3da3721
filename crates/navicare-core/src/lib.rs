//! NaviCare core: conversational symptom triage and provider navigation.
//!
//! ```text
//!   user text / transcript
//!          │
//!          ▼
//!   ┌──────────────┐  effects   ┌──────────────────┐   HTTP   ┌─────────────┐
//!   │ SessionState │ ─────────► │  SessionDriver   │ ───────► │ ModelClient │
//!   │  (reducer)   │ ◄───────── │ (tokio tasks)    │ ◄─────── │  (Gemini)   │
//!   └──────────────┘  events    └──────────────────┘          └─────────────┘
//!                                 │      │      │
//!                          capture│ output│      │saved providers
//!                                 ▼      ▼      ▼
//!                         navicare-voice      ProviderDirectory (sled)
//! ```
//!
//! All reasoning happens in the hosted model. This crate owns the prompt and
//! schema contracts, the session rules and the fallbacks used when the model
//! is unavailable.

pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod locale;
pub mod prompts;
pub mod session;
pub mod types;

pub use config::NavicareConfig;
pub use directory::{toggle_provider, ProviderDirectory, SAVED_PROVIDERS_KEY};
pub use error::{DirectoryError, GatewayError, GatewayResult, SessionError};
pub use gateway::{
    ContentTurn, GeminiClient, GenerateRequest, GenerateResponse, ModelClient, ReasoningGateway,
};
pub use locale::{filter_languages, find_language, Language, DEFAULT_VOICE, LANGUAGES};
pub use session::{
    transition, Effect, Event, Phase, RequestKind, RequestToken, SessionDriver, SessionState,
    Transition, VoiceActivity,
};
pub use types::{
    Message, Provider, ProviderQuery, Role, TriageLevel, TriageResult, TriageTurn,
    DEFAULT_SPECIALTY,
};
