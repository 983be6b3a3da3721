//! Reasoning Gateway: typed intents in, normalized results out.
//!
//! Three exchanges run against the hosted model:
//!
//! ```text
//!   greeting ──► free text ───────────────────────► String (fallback when blank)
//!   triage   ──► JSON (triage schema) ─────────────► TriageTurn (clarification on parse failure)
//!   search   ──► text + web search ──► JSON list ──► Vec<Provider> (empty on any failure)
//!   speech   ──► AUDIO modality ───────────────────► base64 PCM or absent
//! ```
//!
//! Transport failures of greeting, triage and speech are returned to the
//! caller, which owns the fallback text. Parse failures never are.

pub mod client;
pub mod gemini;
pub mod schema;

pub use client::{ContentTurn, GenerateRequest, GenerateResponse, ModelClient};
pub use gemini::GeminiClient;

use crate::config::NavicareConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::locale::Language;
use crate::prompts::{
    greeting_prompt, provider_extraction_prompt, provider_search_prompt, triage_system_instruction,
    GREETING_EMPTY_FALLBACK, TRIAGE_CLARIFICATION_FALLBACK,
};
use crate::types::{Message, Provider, ProviderQuery, TriageTurn};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReasoningGateway {
    client: Arc<dyn ModelClient>,
    model: String,
    speech_model: String,
}

impl ReasoningGateway {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            model: crate::config::DEFAULT_MODEL.to_string(),
            speech_model: crate::config::DEFAULT_SPEECH_MODEL.to_string(),
        }
    }

    /// Gemini-backed gateway from config.
    pub fn from_config(config: &NavicareConfig) -> GatewayResult<Self> {
        let client = GeminiClient::from_config(config)?;
        Ok(Self::new(Arc::new(client))
            .with_model(config.model.clone())
            .with_speech_model(config.speech_model.clone()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Opening greeting in `language`. Blank text becomes the empty-greeting fallback.
    pub async fn request_greeting(&self, language: &Language) -> GatewayResult<String> {
        let request = GenerateRequest::prompt(&self.model, greeting_prompt(language.code));
        let response = self.client.generate(request).await?;
        Ok(response
            .non_empty_text()
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| GREETING_EMPTY_FALLBACK.to_string()))
    }

    /// One triage step over the full ordered history.
    ///
    /// A blank or unparseable answer is an incomplete turn carrying the
    /// clarification fallback; only transport errors are `Err`.
    pub async fn advance_triage(
        &self,
        history: &[Message],
        language: &Language,
    ) -> GatewayResult<TriageTurn> {
        let request = GenerateRequest::conversation(&self.model, history)
            .with_system_instruction(triage_system_instruction(language.code))
            .with_schema(schema::triage_response_schema());
        let response = self.client.generate(request).await?;

        let parsed = response
            .non_empty_text()
            .ok_or(GatewayError::EmptyResponse)
            .and_then(parse_triage_turn);
        match parsed {
            Ok(turn) => Ok(turn),
            Err(e) => {
                tracing::warn!(target: "navicare::gateway", error = %e, "Triage response unusable, asking for clarification");
                Ok(TriageTurn::question(TRIAGE_CLARIFICATION_FALLBACK))
            }
        }
    }

    /// Two-phase provider lookup. Never fails: any error yields an empty list.
    pub async fn search_providers(&self, query: &ProviderQuery) -> Vec<Provider> {
        match self.try_search_providers(query).await {
            Ok(providers) => {
                tracing::info!(
                    target: "navicare::gateway",
                    specialty = %query.specialty,
                    count = providers.len(),
                    "Provider search complete"
                );
                providers
            }
            Err(e) => {
                tracing::warn!(target: "navicare::gateway", error = %e, specialty = %query.specialty, "Provider search failed");
                Vec::new()
            }
        }
    }

    async fn try_search_providers(&self, query: &ProviderQuery) -> GatewayResult<Vec<Provider>> {
        let retrieval = GenerateRequest::prompt(&self.model, provider_search_prompt(query)).with_web_search();
        let found = self.client.generate(retrieval).await?;
        let text = found.non_empty_text().ok_or(GatewayError::EmptyResponse)?;

        let extraction = GenerateRequest::prompt(&self.model, provider_extraction_prompt(text))
            .with_schema(schema::provider_list_schema());
        let extracted = self.client.generate(extraction).await?;
        let json = extracted.non_empty_text().ok_or(GatewayError::EmptyResponse)?;
        parse_provider_list(json, &query.specialty)
    }

    /// Spoken rendition of `text` as base64 PCM16 (24 kHz mono). `None` when the model sent no audio.
    pub async fn synthesize_speech(&self, text: &str, voice: &str) -> GatewayResult<Option<String>> {
        let request = GenerateRequest::prompt(&self.speech_model, text).with_speech(voice);
        let response = self.client.generate(request).await?;
        Ok(response.audio.filter(|a| !a.trim().is_empty()))
    }
}

/// Drop a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

pub fn parse_triage_turn(text: &str) -> GatewayResult<TriageTurn> {
    Ok(serde_json::from_str(strip_code_fences(text))?)
}

/// Parse the extraction answer. Records lacking name, address or phone are
/// skipped; a blank specialty takes the searched one.
pub fn parse_provider_list(text: &str, specialty: &str) -> GatewayResult<Vec<Provider>> {
    let records: Vec<Value> = serde_json::from_str(strip_code_fences(text))?;
    let total = records.len();
    let providers: Vec<Provider> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Provider>(record) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(target: "navicare::gateway", error = %e, "Unreadable provider record dropped");
                None
            }
        })
        .filter(|p| !p.name.trim().is_empty() && !p.address.trim().is_empty() && !p.phone.trim().is_empty())
        .map(|mut p| {
            if p.specialty.trim().is_empty() {
                p.specialty = specialty.to_string();
            }
            p
        })
        .collect();
    if providers.len() < total {
        tracing::debug!(target: "navicare::gateway", skipped = total - providers.len(), "Incomplete provider records dropped");
    }
    Ok(providers)
}
