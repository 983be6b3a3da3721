//! Prompt templates and fixed fallback text for the reasoning service.

pub mod fallback;
pub mod greeting;
pub mod providers;
pub mod triage;

pub use fallback::{
    EMERGENCY_NOTICE, EMERGENCY_NUMBER, FOLLOW_UP_FALLBACK, GREETING_EMPTY_FALLBACK,
    GREETING_FALLBACK, TECHNICAL_ISSUE_MESSAGE, TRIAGE_CLARIFICATION_FALLBACK,
};
pub use greeting::{greeting_prompt, GREETING_TEMPLATE};
pub use providers::{
    provider_extraction_prompt, provider_search_prompt, PROVIDER_EXTRACTION_TEMPLATE,
    PROVIDER_SEARCH_TEMPLATE,
};
pub use triage::{triage_system_instruction, RED_FLAGS, TRIAGE_SYSTEM};
