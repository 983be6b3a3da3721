//! Async effect runner around the pure session reducer.
//!
//! Gateway calls and speech synthesis run as spawned tasks; their outcomes
//! come back through an internal channel as `Event`s, together with events
//! from the capture device. The caller pulls them with `next_event` and feeds
//! them to `dispatch`, or lets `settle` do both until the session is idle.

use super::effect::Effect;
use super::event::Event;
use super::state::SessionState;
use super::transition::transition;
use crate::directory::ProviderDirectory;
use crate::error::{DirectoryError, SessionError};
use crate::gateway::ReasoningGateway;
use crate::locale::Language;
use crate::types::Provider;
use chrono::Utc;
use navicare_voice::{decode_base64_to_pcm, CaptureEvent, SpeechCapture, SpeechOutput};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct SessionDriver {
    state: SessionState,
    gateway: ReasoningGateway,
    directory: ProviderDirectory,
    capture: Arc<dyn SpeechCapture>,
    output: Arc<dyn SpeechOutput>,
    /// Overrides the language's voice persona when set.
    voice: Option<String>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    capture_tx: mpsc::UnboundedSender<CaptureEvent>,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    request_task: Option<JoinHandle<()>>,
    speech_task: Option<JoinHandle<()>>,
    session_id: Uuid,
}

impl SessionDriver {
    pub fn new(
        gateway: ReasoningGateway,
        directory: ProviderDirectory,
        capture: Arc<dyn SpeechCapture>,
        output: Arc<dyn SpeechOutput>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        Self {
            state: SessionState::default(),
            gateway,
            directory,
            capture,
            output,
            voice: None,
            events_tx,
            events_rx,
            capture_tx,
            capture_rx,
            request_task: None,
            speech_task: None,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.state.language = language;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn directory(&self) -> &ProviderDirectory {
        &self.directory
    }

    pub fn capture_available(&self) -> bool {
        self.capture.is_available()
    }

    /// Run one event through the reducer and execute its effects. The new
    /// state is committed after the effects, so a reset completes only once
    /// audio has been released.
    pub async fn dispatch(&mut self, event: Event) -> Result<(), SessionError> {
        let outcome = transition(&self.state, event);
        let next = match outcome {
            Ok(next) => next,
            Err(e) => {
                tracing::debug!(target: "navicare::session", session_id = %self.session_id, error = %e, "Action refused");
                return Err(e);
            }
        };
        for effect in next.effects {
            self.run_effect(effect).await;
        }
        self.state = next.state;
        Ok(())
    }

    /// Next result from a background task or the capture device.
    pub async fn next_event(&mut self) -> Event {
        tokio::select! {
            Some(event) = self.events_rx.recv() => event,
            Some(event) = self.capture_rx.recv() => capture_event(event),
        }
    }

    /// Dispatch background results until no gateway call or playback is pending.
    /// Capture events that arrive meanwhile are handled too.
    pub async fn settle(&mut self) {
        while self.state.in_flight.is_some() || self.state.speaking {
            let event = self.next_event().await;
            self.dispatch_background(event).await;
        }
    }

    /// Dispatch whatever background events are already queued, without waiting.
    pub async fn drain(&mut self) {
        loop {
            let event = match self.events_rx.try_recv() {
                Ok(event) => event,
                Err(_) => match self.capture_rx.try_recv() {
                    Ok(event) => capture_event(event),
                    Err(_) => break,
                },
            };
            self.dispatch_background(event).await;
        }
    }

    /// Background events may be refused (a transcript after the session resolved); that is logged, not returned.
    pub async fn dispatch_background(&mut self, event: Event) {
        if let Err(e) = self.dispatch(event).await {
            tracing::info!(target: "navicare::session", session_id = %self.session_id, error = %e, "Background event dropped");
        }
    }

    pub async fn start(&mut self) -> Result<(), SessionError> {
        tracing::info!(target: "navicare::session", session_id = %self.session_id, language = self.state.language.code, "Session started");
        self.dispatch(Event::Start).await
    }

    pub async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        self.dispatch(Event::submit(text)).await
    }

    pub async fn select_language(&mut self, language: Language) -> Result<(), SessionError> {
        self.dispatch(Event::SelectLanguage(language)).await
    }

    pub async fn set_search_inputs(&mut self, zip_code: &str, insurance: &str) -> Result<(), SessionError> {
        self.dispatch(Event::SetSearchInputs {
            zip_code: zip_code.to_string(),
            insurance: insurance.to_string(),
        })
        .await
    }

    pub async fn search(&mut self) -> Result<(), SessionError> {
        self.dispatch(Event::SearchProviders).await
    }

    pub async fn toggle_listening(&mut self) -> Result<(), SessionError> {
        self.dispatch(Event::ToggleListening).await
    }

    pub async fn read_aloud(&mut self, index: usize) -> Result<(), SessionError> {
        self.dispatch(Event::ReadAloud { index }).await
    }

    pub async fn reset(&mut self) -> Result<(), SessionError> {
        self.dispatch(Event::Reset).await?;
        tracing::info!(target: "navicare::session", session_id = %self.session_id, "Session reset");
        self.session_id = Uuid::new_v4();
        Ok(())
    }

    /// Save or unsave a provider. Returns whether it is saved afterwards.
    pub fn toggle_saved(&mut self, provider: &Provider) -> Result<bool, DirectoryError> {
        self.directory.toggle_saved(provider)?;
        Ok(self.directory.is_saved(provider))
    }

    async fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestGreeting { token, language } => {
                let gateway = self.gateway.clone();
                let tx = self.events_tx.clone();
                let session_id = self.session_id;
                self.spawn_request(async move {
                    let greeting = match gateway.request_greeting(&language).await {
                        Ok(greeting) => Some(greeting),
                        Err(e) => {
                            tracing::warn!(target: "navicare::session", %session_id, error = %e, "Greeting failed, using fallback");
                            None
                        }
                    };
                    let _ = tx.send(Event::GreetingReady {
                        token: token.id,
                        greeting,
                        at: Utc::now(),
                    });
                });
            }
            Effect::RequestTriage { token, history, language } => {
                let gateway = self.gateway.clone();
                let tx = self.events_tx.clone();
                let session_id = self.session_id;
                self.spawn_request(async move {
                    let reply = match gateway.advance_triage(&history, &language).await {
                        Ok(turn) => {
                            if let Some(result) = turn.resolved() {
                                tracing::info!(target: "navicare::session", %session_id, level = %result.level, "Triage complete");
                            }
                            Some(turn)
                        }
                        Err(e) => {
                            tracing::warn!(target: "navicare::session", %session_id, error = %e, "Triage request failed");
                            None
                        }
                    };
                    let _ = tx.send(Event::TriageReplied {
                        token: token.id,
                        reply,
                        at: Utc::now(),
                    });
                });
            }
            Effect::RequestProviders { token, query } => {
                let gateway = self.gateway.clone();
                let tx = self.events_tx.clone();
                self.spawn_request(async move {
                    let providers = gateway.search_providers(&query).await;
                    let _ = tx.send(Event::ProvidersFound {
                        token: token.id,
                        providers,
                    });
                });
            }
            Effect::StartCapture { language } => {
                if let Err(e) = self.capture.start(&language, self.capture_tx.clone()) {
                    tracing::warn!(target: "navicare::session", session_id = %self.session_id, error = %e, "Speech capture failed to start");
                    let _ = self.events_tx.send(Event::CaptureFailed {
                        reason: e.to_string(),
                    });
                }
            }
            Effect::StopCapture => self.capture.stop(),
            Effect::CancelCapture => {
                self.capture.cancel();
                // transcripts already queued or still in flight go to the dropped receiver
                let (capture_tx, capture_rx) = mpsc::unbounded_channel();
                self.capture_tx = capture_tx;
                self.capture_rx = capture_rx;
            }
            Effect::Speak { text, voice } => {
                let voice = self.voice.clone().unwrap_or(voice);
                let gateway = self.gateway.clone();
                let output = Arc::clone(&self.output);
                let tx = self.events_tx.clone();
                let session_id = self.session_id;
                if let Some(task) = self.speech_task.take() {
                    task.abort();
                }
                self.speech_task = Some(tokio::spawn(async move {
                    speak(&gateway, output.as_ref(), &text, &voice, session_id).await;
                    let _ = tx.send(Event::SpeechFinished);
                }));
            }
            Effect::CancelRequest => {
                if let Some(task) = self.request_task.take() {
                    task.abort();
                }
                // same for replies and SpeechFinished from aborted tasks
                let (events_tx, events_rx) = mpsc::unbounded_channel();
                self.events_tx = events_tx;
                self.events_rx = events_rx;
            }
            Effect::ReleaseAudio => {
                if let Some(task) = self.speech_task.take() {
                    task.abort();
                }
                if let Err(e) = self.output.release().await {
                    tracing::warn!(target: "navicare::session", session_id = %self.session_id, error = %e, "Audio release failed");
                }
            }
        }
    }

    fn spawn_request<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.request_task.take() {
            previous.abort();
        }
        self.request_task = Some(tokio::spawn(task));
    }
}

/// Synthesize and play. Absent audio is treated like a failure: nothing is played and nothing is retried.
async fn speak(gateway: &ReasoningGateway, output: &dyn SpeechOutput, text: &str, voice: &str, session_id: Uuid) {
    let payload = match gateway.synthesize_speech(text, voice).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::warn!(target: "navicare::session", %session_id, "Speech synthesis returned no audio");
            return;
        }
        Err(e) => {
            tracing::warn!(target: "navicare::session", %session_id, error = %e, "Speech synthesis failed");
            return;
        }
    };
    let pcm = match decode_base64_to_pcm(&payload) {
        Ok(pcm) => pcm,
        Err(e) => {
            tracing::warn!(target: "navicare::session", %session_id, error = %e, "Speech payload undecodable");
            return;
        }
    };
    if let Err(e) = output.play(pcm).await {
        tracing::warn!(target: "navicare::session", %session_id, error = %e, "Playback failed");
    }
}

fn capture_event(event: CaptureEvent) -> Event {
    match event {
        CaptureEvent::Transcript(text) => Event::Transcript { text, at: Utc::now() },
        CaptureEvent::Error(reason) => {
            tracing::warn!(target: "navicare::session", %reason, "Speech capture error");
            Event::CaptureFailed { reason }
        }
        CaptureEvent::Ended => Event::CaptureEnded,
    }
}
