//! Raw request/response contract with the hosted model.
//!
//! `ModelClient` is the only seam that touches the network. The gateway
//! builds `GenerateRequest`s and interprets `GenerateResponse`s; tests swap in
//! a scripted client.

use crate::error::GatewayResult;
use crate::types::{Message, Role};
use async_trait::async_trait;
use serde_json::Value;

/// One content turn sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTurn {
    pub role: Role,
    pub text: String,
}

impl From<&Message> for ContentTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}

/// A single generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Vec<ContentTurn>,
    pub system_instruction: Option<String>,
    /// When set, the model must answer JSON conforming to this schema.
    pub response_schema: Option<Value>,
    /// Let the model consult web search before answering.
    pub web_search: bool,
    /// When set, request audio output spoken by this prebuilt voice.
    pub speech_voice: Option<String>,
}

impl GenerateRequest {
    /// Single user prompt.
    pub fn prompt(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: vec![ContentTurn {
                role: Role::User,
                text: text.into(),
            }],
            ..Self::default()
        }
    }

    /// Full conversation, order preserved.
    pub fn conversation(model: impl Into<String>, history: &[Message]) -> Self {
        Self {
            model: model.into(),
            contents: history.iter().map(ContentTurn::from).collect(),
            ..Self::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    pub fn with_speech(mut self, voice: impl Into<String>) -> Self {
        self.speech_voice = Some(voice.into());
        self
    }
}

/// What came back from a generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Concatenated text parts of the first candidate.
    pub text: Option<String>,
    /// Base64 inline audio of the first candidate.
    pub audio: Option<String>,
}

impl GenerateResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            audio: None,
        }
    }

    pub fn audio(data: impl Into<String>) -> Self {
        Self {
            text: None,
            audio: Some(data.into()),
        }
    }

    /// Text, if present and not blank.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> GatewayResult<GenerateResponse>;
}
