//! Session State Machine.
//!
//! Pure reducer over explicit events (`transition`) plus an async driver that
//! runs the resulting effects against the gateway, speech devices and the
//! provider directory, and feeds their outcomes back in as events.

pub mod driver;
mod effect;
pub mod event;
pub mod state;
mod transition;

pub use driver::SessionDriver;
pub use effect::Effect;
pub use event::Event;
pub use state::{Phase, RequestKind, RequestToken, SessionState, VoiceActivity};
pub use transition::{transition, Transition};
