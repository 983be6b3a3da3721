//! **RodioOutput**: speaker playback for synthesized speech.
//!
//! rodio's `OutputStream` is not `Send`, so the device lives on a dedicated
//! worker thread that is created on first `play` and torn down by `release`.
//! Only one utterance plays at a time; a second `play` is rejected.

use crate::codec::{pcm_to_audio_buffer, AudioBuffer, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::{VoiceError, VoiceResult};
use crate::speech::SpeechOutput;
use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Command {
    Play {
        buffer: AudioBuffer,
        done: oneshot::Sender<VoiceResult<()>>,
    },
    Close,
}

struct PlaybackWorker {
    commands: mpsc::Sender<Command>,
    thread: thread::JoinHandle<()>,
}

/// Plays mono PCM16 (24 kHz unless configured) on the default output device.
pub struct RodioOutput {
    worker: Mutex<Option<PlaybackWorker>>,
    playing: Arc<AtomicBool>,
    sample_rate: u32,
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioOutput {
    /// No device is opened until the first `play`.
    pub fn new() -> Self {
        Self {
            worker: Mutex::new(None),
            playing: Arc::new(AtomicBool::new(false)),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Playback rate for incoming PCM. Must match the rate the speech model
    /// synthesizes at (24 kHz), or speech plays at the wrong pitch.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    fn command_sender(&self) -> VoiceResult<mpsc::Sender<Command>> {
        let mut guard = self
            .worker
            .lock()
            .map_err(|e| VoiceError::Playback(format!("worker lock poisoned: {}", e)))?;
        if let Some(ref worker) = *guard {
            return Ok(worker.commands.clone());
        }
        let worker = spawn_worker()?;
        let sender = worker.commands.clone();
        *guard = Some(worker);
        Ok(sender)
    }
}

fn spawn_worker() -> VoiceResult<PlaybackWorker> {
    let (commands, command_rx) = mpsc::channel();
    let (ready_tx, ready_rx) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("navicare-playback".to_string())
        .spawn(move || run_worker(command_rx, ready_tx))?;
    match ready_rx.recv() {
        Ok(Ok(())) => Ok(PlaybackWorker { commands, thread }),
        Ok(Err(e)) => {
            let _ = thread.join();
            Err(e)
        }
        Err(_) => Err(VoiceError::Playback("playback worker exited during init".to_string())),
    }
}

fn run_worker(commands: mpsc::Receiver<Command>, ready: mpsc::Sender<VoiceResult<()>>) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(VoiceError::Playback(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&stream_handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready.send(Err(VoiceError::Playback(e.to_string())));
            return;
        }
    };
    info!("🔊 Speech output opened");
    let _ = ready.send(Ok(()));

    let mut pending: Option<oneshot::Sender<VoiceResult<()>>> = None;
    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(Command::Play { buffer, done }) => {
                debug!(ms = buffer.duration().as_millis() as u64, "Playing speech");
                let source = SamplesBuffer::new(
                    buffer.channel_count() as u16,
                    buffer.sample_rate,
                    buffer.interleaved(),
                );
                sink.append(source);
                sink.play();
                pending = Some(done);
            }
            Ok(Command::Close) | Err(RecvTimeoutError::Disconnected) => {
                sink.stop();
                if let Some(done) = pending.take() {
                    let _ = done.send(Ok(()));
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending.is_some() && sink.empty() {
                    if let Some(done) = pending.take() {
                        let _ = done.send(Ok(()));
                    }
                }
            }
        }
    }
    info!("⏹️ Speech output closed");
}

#[async_trait]
impl SpeechOutput for RodioOutput {
    async fn play(&self, pcm: Vec<u8>) -> VoiceResult<()> {
        if self.playing.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::PlaybackBusy);
        }
        let result = async {
            let buffer = pcm_to_audio_buffer(&pcm, self.sample_rate, DEFAULT_CHANNELS)?;
            if buffer.is_empty() {
                return Ok(());
            }
            let sender = self.command_sender()?;
            let (done, finished) = oneshot::channel();
            sender
                .send(Command::Play { buffer, done })
                .map_err(|_| VoiceError::Playback("playback worker is gone".to_string()))?;
            finished
                .await
                .map_err(|_| VoiceError::Playback("playback worker dropped request".to_string()))?
        }
        .await;
        self.playing.store(false, Ordering::SeqCst);
        result
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    async fn release(&self) -> VoiceResult<()> {
        let worker = self
            .worker
            .lock()
            .map_err(|e| VoiceError::Playback(format!("worker lock poisoned: {}", e)))?
            .take();
        let Some(worker) = worker else {
            return Ok(());
        };
        let _ = worker.commands.send(Command::Close);
        let joined = tokio::task::spawn_blocking(move || worker.thread.join())
            .await
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        if joined.is_err() {
            warn!("Speech output worker panicked during release");
        }
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }
}
