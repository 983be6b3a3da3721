//! NaviCare configuration.
//!
//! Precedence: env `NAVICARE__*` > file at `NAVICARE_CONFIG` (default
//! `config/navicare.toml`) > built-in defaults. Binaries load `.env` first.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | api_key | (env GEMINI_API_KEY / API_KEY) | Reasoning service key. |
//! | base_url | Gemini v1beta | REST root, `/models/{model}:generateContent` is appended. |
//! | model | gemini-3-flash-preview | Triage, greeting and provider model. |
//! | speech_model | gemini-2.5-flash-preview-tts | Speech synthesis model. |
//! | storage_path | ./data | Directory for the saved-provider store. |
//! | default_language | English | Language preselected at consent. |
//! | voice | Kore | Speech synthesis voice persona. |
//! | sample_rate | 24000 | Synthesized PCM sample rate. |
//! | request_timeout_secs | unset | Client timeout; unset means none. |
//! | stt_base_url / stt_api_key / stt_model | OpenAI / (env) / whisper-1 | Microphone transcription. |

use crate::locale::{find_language, Language, DEFAULT_VOICE};
use navicare_voice::DEFAULT_SAMPLE_RATE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_STT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavicareConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub speech_model: String,
    pub storage_path: String,
    pub default_language: String,
    /// Prebuilt voice persona for read-aloud.
    pub voice: String,
    /// Playback rate for synthesized PCM. The speech model returns 24 kHz;
    /// any other value plays speech at the wrong pitch.
    pub sample_rate: u32,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    pub stt_base_url: String,
    #[serde(default)]
    pub stt_api_key: Option<String>,
    pub stt_model: String,
}

impl Default for NavicareConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            storage_path: "./data".to_string(),
            default_language: "English".to_string(),
            voice: DEFAULT_VOICE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            request_timeout_secs: None,
            stt_base_url: DEFAULT_STT_BASE_URL.to_string(),
            stt_api_key: None,
            stt_model: DEFAULT_STT_MODEL.to_string(),
        }
    }
}

impl NavicareConfig {
    /// Load config from file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("NAVICARE_CONFIG").unwrap_or_else(|_| "config/navicare.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load with an explicit file path (missing file is fine).
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("model", defaults.model)?
            .set_default("speech_model", defaults.speech_model)?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("default_language", defaults.default_language)?
            .set_default("voice", defaults.voice)?
            .set_default("sample_rate", i64::from(defaults.sample_rate))?
            .set_default("stt_base_url", defaults.stt_base_url)?
            .set_default("stt_model", defaults.stt_model)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("NAVICARE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Configured key, else GEMINI_API_KEY, else API_KEY. Blank counts as missing.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Configured STT key, else OPENAI_API_KEY.
    pub fn resolved_stt_api_key(&self) -> Option<String> {
        self.stt_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Sled directory holding saved providers.
    pub fn directory_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("saved_providers")
    }

    /// Configured default language; unknown names fall back to English.
    pub fn language(&self) -> Language {
        find_language(&self.default_language).unwrap_or_default()
    }
}
