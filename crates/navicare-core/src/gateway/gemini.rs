//! Gemini `generateContent` over REST.

use super::client::{GenerateRequest, GenerateResponse, ModelClient};
use crate::config::{NavicareConfig, DEFAULT_BASE_URL};
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Talks to `{base_url}/models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into().trim().to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build from config. Fails when no API key can be resolved.
    pub fn from_config(config: &NavicareConfig) -> GatewayResult<Self> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            GatewayError::Config("no API key (set GEMINI_API_KEY or NAVICARE__API_KEY)".into())
        })?;
        let client = match config.request_timeout() {
            Some(timeout) => build_client(timeout)?,
            None => reqwest::Client::new(),
        };
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> GatewayResult<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

fn build_client(timeout: Duration) -> GatewayResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Config(e.to_string()))
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> GatewayResult<GenerateResponse> {
        let body = GenerateContentRequest::from(&request);
        tracing::debug!(
            target: "navicare::gateway",
            model = %request.model,
            turns = request.contents.len(),
            structured = request.response_schema.is_some(),
            web_search = request.web_search,
            speech = request.speech_voice.is_some(),
            "generateContent"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message: error_message(&body_text),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed.into_response())
    }
}

// Wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
}

impl From<&GenerateRequest> for GenerateContentRequest {
    fn from(request: &GenerateRequest) -> Self {
        let contents = request
            .contents
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.as_str().to_string()),
                parts: vec![TextPart {
                    text: turn.text.clone(),
                }],
            })
            .collect();

        let system_instruction = request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![TextPart { text: text.clone() }],
        });

        let tools = if request.web_search {
            vec![serde_json::json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };

        let generation_config = if request.response_schema.is_some() || request.speech_voice.is_some() {
            Some(GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
                response_modalities: request.speech_voice.as_ref().map(|_| vec!["AUDIO".to_string()]),
                speech_config: request.speech_voice.as_ref().map(|voice| {
                    serde_json::json!({
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                    })
                }),
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction,
            tools,
            generation_config,
        }
    }
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate are concatenated; the first inline blob is the audio.
    fn into_response(self) -> GenerateResponse {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut text: Option<String> = None;
        let mut audio: Option<String> = None;
        for part in parts {
            if let Some(t) = part.text {
                text.get_or_insert_with(String::new).push_str(&t);
            }
            if audio.is_none() {
                audio = part.inline_data.map(|d| d.data);
            }
        }
        GenerateResponse { text, audio }
    }
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| match (w.error.status, w.error.message) {
            (Some(status), Some(message)) => Some(format!("{}: {}", status, message)),
            (None, Some(message)) => Some(message),
            (Some(status), None) => Some(status),
            (None, None) => None,
        })
        .unwrap_or_else(|| body.to_string())
}
