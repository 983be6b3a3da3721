//! Fixed text used whenever the reasoning service fails or answers without content.

/// Greeting when the service answered but with no text.
pub const GREETING_EMPTY_FALLBACK: &str = "Hello, how can I help you today?";

/// Greeting when the greeting request failed outright.
pub const GREETING_FALLBACK: &str = "Hello, I am NaviCare AI. How can I help you today?";

/// Model turn when a triage response could not be parsed.
pub const TRIAGE_CLARIFICATION_FALLBACK: &str =
    "I'm sorry, I'm having trouble processing that. Can you tell me more about your symptoms?";

/// Model turn when an incomplete triage response carries no question.
pub const FOLLOW_UP_FALLBACK: &str = "Can you tell me more?";

/// Model turn when the triage request itself failed.
pub const TECHNICAL_ISSUE_MESSAGE: &str =
    "I'm having a technical issue. Please try again or seek medical advice if your symptoms are concerning.";

pub const EMERGENCY_NUMBER: &str = "911";

/// Shown once a session has escalated to EMERGENCY.
pub const EMERGENCY_NOTICE: &str =
    "IMMEDIATE ACTION: You indicated symptoms that require immediate medical intervention. Call 911 or go to the nearest emergency room now.";
