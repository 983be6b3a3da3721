//! In-process doubles for the model service and speech devices.

#![allow(dead_code)]

use async_trait::async_trait;
use navicare_core::{
    GatewayError, GatewayResult, GenerateRequest, GenerateResponse, ModelClient, ProviderDirectory,
    ReasoningGateway, SessionDriver,
};
use navicare_voice::{CaptureEvent, SpeechCapture, SpeechOutput, VoiceResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub enum Reply {
    Text(String),
    Audio(String),
    Empty,
    Fail,
}

/// Answers requests in order from a script and records every request.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn generate(&self, request: GenerateRequest) -> GatewayResult<GenerateResponse> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(GenerateResponse::text(text)),
            Some(Reply::Audio(data)) => Ok(GenerateResponse::audio(data)),
            Some(Reply::Empty) => Ok(GenerateResponse::default()),
            Some(Reply::Fail) => Err(GatewayError::Http {
                status: 503,
                message: "UNAVAILABLE: overloaded".into(),
            }),
            None => Err(GatewayError::Transport("script exhausted".into())),
        }
    }
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

/// Records played PCM and release calls. Playback completes immediately.
#[derive(Default)]
pub struct RecordingOutput {
    pub played: Mutex<Vec<Vec<u8>>>,
    pub releases: AtomicUsize,
    playing: AtomicBool,
}

#[async_trait]
impl SpeechOutput for RecordingOutput {
    async fn play(&self, pcm: Vec<u8>) -> VoiceResult<()> {
        self.playing.store(true, Ordering::SeqCst);
        self.played.lock().unwrap().push(pcm);
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    async fn release(&self) -> VoiceResult<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Emits a fixed transcript then `Ended` as soon as capture starts.
#[derive(Default)]
pub struct ScriptedCapture {
    pub transcript: Option<String>,
    pub languages: Mutex<Vec<String>>,
    pub stops: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl ScriptedCapture {
    pub fn saying(text: &str) -> Self {
        Self {
            transcript: Some(text.to_string()),
            ..Self::default()
        }
    }
}

impl SpeechCapture for ScriptedCapture {
    fn start(&self, language: &str, events: mpsc::UnboundedSender<CaptureEvent>) -> VoiceResult<()> {
        self.languages.lock().unwrap().push(language.to_string());
        if let Some(text) = &self.transcript {
            let _ = events.send(CaptureEvent::Transcript(text.clone()));
        }
        let _ = events.send(CaptureEvent::Ended);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub driver: SessionDriver,
    pub client: Arc<ScriptedClient>,
    pub output: Arc<RecordingOutput>,
    pub capture: Arc<ScriptedCapture>,
}

pub fn harness(replies: Vec<Reply>) -> Harness {
    harness_with_capture(replies, ScriptedCapture::default())
}

/// Route `RUST_LOG`-filtered logs through the test writer so they show for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn harness_with_capture(replies: Vec<Reply>, capture: ScriptedCapture) -> Harness {
    init_tracing();
    let client = ScriptedClient::new(replies);
    let output = Arc::new(RecordingOutput::default());
    let capture = Arc::new(capture);
    let gateway = ReasoningGateway::new(client.clone()).with_model("gemini-test");
    let directory = ProviderDirectory::temporary().unwrap();
    let driver = SessionDriver::new(gateway, directory, capture.clone(), output.clone());
    Harness {
        driver,
        client,
        output,
        capture,
    }
}

/// `settle` with a deadline so a broken script fails instead of hanging.
pub async fn settle(driver: &mut SessionDriver) {
    tokio::time::timeout(Duration::from_secs(5), driver.settle())
        .await
        .expect("session did not settle");
}

pub fn question(q: &str) -> Reply {
    Reply::Text(format!(r#"{{"isTriageComplete":false,"nextQuestion":"{}"}}"#, q))
}

pub fn complete(level: &str, specialty: Option<&str>) -> Reply {
    let specialty = specialty
        .map(|s| format!(r#","specialtyNeeded":"{}""#, s))
        .unwrap_or_default();
    Reply::Text(format!(
        r#"{{"isTriageComplete":true,"triageResult":{{"level":"{}","recommendation":"Follow the care plan.","reasonForReferral":"Symptoms reported","summary":"Patient summary"{}}}}}"#,
        level, specialty
    ))
}
