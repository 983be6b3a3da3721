//! Microphone capture using CPAL, transcribed by an `SttBackend`.
//!
//! One utterance per `start`: samples accumulate until `stop` (or the maximum
//! utterance length), then the recording is transcribed and delivered as a
//! `CaptureEvent::Transcript`, followed by `CaptureEvent::Ended`.

use crate::error::{VoiceError, VoiceResult};
use crate::speech::{CaptureEvent, SpeechCapture};
use crate::stt::SttBackend;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{info, warn};

/// Recording stops on its own after this long.
const DEFAULT_MAX_UTTERANCE: Duration = Duration::from_secs(30);

enum Signal {
    Stop,
    Cancel,
}

struct ActiveCapture {
    signals: mpsc::Sender<Signal>,
    finished: Arc<AtomicBool>,
}

/// Default input device + transcription backend.
pub struct MicrophoneCapture {
    stt: Arc<dyn SttBackend>,
    max_utterance: Duration,
    active: Mutex<Option<ActiveCapture>>,
}

impl MicrophoneCapture {
    pub fn new(stt: Arc<dyn SttBackend>) -> Self {
        Self {
            stt,
            max_utterance: DEFAULT_MAX_UTTERANCE,
            active: Mutex::new(None),
        }
    }

    pub fn with_max_utterance(mut self, max: Duration) -> Self {
        self.max_utterance = max;
        self
    }

    /// List available input devices
    pub fn list_input_devices() -> VoiceResult<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices()?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn signal(&self, signal: Signal) {
        let active = match self.active.lock() {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                warn!("capture lock poisoned: {}", e);
                return;
            }
        };
        if let Some(active) = active {
            let _ = active.signals.send(signal);
        }
    }
}

impl SpeechCapture for MicrophoneCapture {
    fn start(&self, language: &str, events: tokio_mpsc::UnboundedSender<CaptureEvent>) -> VoiceResult<()> {
        let mut guard = self
            .active
            .lock()
            .map_err(|e| VoiceError::AudioDevice(format!("capture lock poisoned: {}", e)))?;
        if let Some(ref active) = *guard {
            if !active.finished.load(Ordering::SeqCst) {
                return Err(VoiceError::CaptureBusy);
            }
        }

        let (signals, signal_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let stt = Arc::clone(&self.stt);
        let max_utterance = self.max_utterance;
        let thread_finished = Arc::clone(&finished);
        let language = language.to_string();

        thread::Builder::new()
            .name("navicare-capture".to_string())
            .spawn(move || {
                run_capture(&language, stt, max_utterance, signal_rx, ready_tx, events);
                thread_finished.store(true, Ordering::SeqCst);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *guard = Some(ActiveCapture { signals, finished });
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(VoiceError::AudioDevice("capture thread exited during init".to_string())),
        }
    }

    fn stop(&self) {
        self.signal(Signal::Stop);
    }

    fn cancel(&self) {
        self.signal(Signal::Cancel);
    }
}

fn open_input(
    samples: Arc<Mutex<Vec<f32>>>,
) -> VoiceResult<(cpal::Stream, u32)> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| VoiceError::AudioDevice("No input device available".to_string()))?;
    info!("📱 Using input device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

    let stream_config: StreamConfig = device.default_input_config()?.into();
    let channels = stream_config.channels.max(1) as usize;
    let sample_rate = stream_config.sample_rate.0;

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buf) = samples.lock() {
                // Downmix to mono
                for frame in data.chunks(channels) {
                    buf.push(frame.iter().sum::<f32>() / frame.len() as f32);
                }
            }
        },
        move |err| {
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;
    stream.play()?;
    Ok((stream, sample_rate))
}

fn run_capture(
    language: &str,
    stt: Arc<dyn SttBackend>,
    max_utterance: Duration,
    signals: mpsc::Receiver<Signal>,
    ready: mpsc::Sender<VoiceResult<()>>,
    events: tokio_mpsc::UnboundedSender<CaptureEvent>,
) {
    let samples = Arc::new(Mutex::new(Vec::new()));
    let (stream, sample_rate) = match open_input(Arc::clone(&samples)) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    info!(language, sample_rate, "🎤 Listening");

    let cancelled = match signals.recv_timeout(max_utterance) {
        Ok(Signal::Cancel) => true,
        Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => false,
        Err(RecvTimeoutError::Timeout) => {
            warn!("⏱️ Max utterance length reached, stopping capture");
            false
        }
    };
    drop(stream);

    if cancelled {
        info!("Capture cancelled; discarding audio");
        let _ = events.send(CaptureEvent::Ended);
        return;
    }

    let recorded = match samples.lock() {
        Ok(mut buf) => std::mem::take(&mut *buf),
        Err(e) => {
            let _ = events.send(CaptureEvent::Error(format!("sample buffer poisoned: {}", e)));
            let _ = events.send(CaptureEvent::Ended);
            return;
        }
    };
    info!(samples = recorded.len(), "Capture stopped, transcribing");

    match stt.transcribe(&recorded, sample_rate) {
        Ok(text) if !text.trim().is_empty() => {
            let _ = events.send(CaptureEvent::Transcript(text));
        }
        Ok(_) => {}
        Err(e) => {
            let _ = events.send(CaptureEvent::Error(e.to_string()));
        }
    }
    let _ = events.send(CaptureEvent::Ended);
}
