//! # NaviCare Voice - speech side channels for the triage session
//!
//! The session never talks to an audio device directly. It is handed two
//! capabilities and feeds text through them:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Triage Session                          │
//! │  ┌──────────────┐                      ┌──────────────┐      │
//! │  │SpeechCapture │── CaptureEvent ────→ │  text input  │      │
//! │  │ (cpal + STT) │   (Transcript)       │     path     │      │
//! │  └──────────────┘                      └──────────────┘      │
//! │  ┌──────────────┐   base64 PCM16       ┌──────────────┐      │
//! │  │ SpeechOutput │←── codec ←────────── │  TTS reply   │      │
//! │  │   (rodio)    │   24kHz mono         │              │      │
//! │  └──────────────┘                      └──────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Device-backed implementations require the `device` feature. Without it the
//! crate still provides the codec, the capability traits and headless
//! implementations ([`SilentOutput`], [`NoCapture`]).

pub mod codec;
pub mod error;
pub mod speech;
pub mod stt;

#[cfg(feature = "device")]
pub mod capture;
#[cfg(feature = "device")]
pub mod playback;

pub use codec::{
    decode_base64_to_pcm, pcm_f32_to_wav, pcm_to_audio_buffer, AudioBuffer, DEFAULT_CHANNELS,
    DEFAULT_SAMPLE_RATE,
};
pub use error::{VoiceError, VoiceResult};
pub use speech::{CaptureEvent, NoCapture, SilentOutput, SpeechCapture, SpeechOutput};
pub use stt::{create_best_stt, OpenAiStt, PlaceholderStt, SttBackend};

#[cfg(feature = "device")]
pub use capture::MicrophoneCapture;
#[cfg(feature = "device")]
pub use playback::RodioOutput;
