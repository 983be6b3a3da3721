//! Speech capabilities injected into the triage session.
//!
//! `SpeechCapture` turns the user's voice into a transcript; `SpeechOutput`
//! plays synthesized PCM. Both are object-safe so the session can hold them as
//! `Arc<dyn ...>` and tests can substitute recording doubles.

use crate::codec::{pcm_to_audio_buffer, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Events emitted by a capture source after `start`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Final transcript of what the user said.
    Transcript(String),
    /// Capture failed (device, permission, STT). Capture is over.
    Error(String),
    /// Capture finished, with or without a transcript.
    Ended,
}

/// Voice input. `start` begins one utterance; results arrive on `events`.
pub trait SpeechCapture: Send + Sync {
    /// Begin capturing in the given language. Fails if already capturing.
    fn start(&self, language: &str, events: mpsc::UnboundedSender<CaptureEvent>) -> VoiceResult<()>;

    /// Stop listening and deliver a transcript of what was heard so far.
    fn stop(&self);

    /// Stop listening and discard anything heard. Defaults to `stop`.
    fn cancel(&self) {
        self.stop();
    }

    /// Whether this capture source can ever produce a transcript.
    fn is_available(&self) -> bool {
        true
    }
}

/// Voice output for PCM16LE speech at 24 kHz mono.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Play raw PCM bytes. Resolves when playback completes.
    /// Rejected with `PlaybackBusy` while another playback is active.
    async fn play(&self, pcm: Vec<u8>) -> VoiceResult<()>;

    /// Whether playback is currently active.
    fn is_playing(&self) -> bool;

    /// Stop playback and close the output device. Safe to call when nothing is open.
    async fn release(&self) -> VoiceResult<()>;
}

/// Headless capture: never available.
#[derive(Debug, Default)]
pub struct NoCapture;

impl SpeechCapture for NoCapture {
    fn start(&self, _language: &str, _events: mpsc::UnboundedSender<CaptureEvent>) -> VoiceResult<()> {
        Err(VoiceError::Unavailable("no speech capture configured".to_string()))
    }

    fn stop(&self) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// Headless output: decodes the PCM (so malformed audio still fails) and returns immediately.
#[derive(Debug, Default)]
pub struct SilentOutput;

#[async_trait]
impl SpeechOutput for SilentOutput {
    async fn play(&self, pcm: Vec<u8>) -> VoiceResult<()> {
        let buffer = pcm_to_audio_buffer(&pcm, DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS)?;
        debug!(frames = buffer.frame_count(), "SilentOutput: discarding speech");
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }

    async fn release(&self) -> VoiceResult<()> {
        Ok(())
    }
}
