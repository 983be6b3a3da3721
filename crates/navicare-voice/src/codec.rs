//! PCM codec for synthesized speech.
//!
//! The reasoning service returns speech as base64-encoded signed 16-bit
//! little-endian PCM, 24 kHz, mono. These functions are pure: the same bytes
//! always produce the same samples, bit for bit.

use crate::error::{VoiceError, VoiceResult};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use std::time::Duration;

/// Sample rate of synthesized speech (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech.
pub const DEFAULT_CHANNELS: u16 = 1;

/// Standard alphabet; accepts payloads with or without trailing `=` padding.
const PCM_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded audio, one sample vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    /// Per-channel samples in [-1.0, 1.0). All channels have the same length.
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Re-interleave channels frame by frame (the layout audio sinks expect).
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channel_count());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

/// Standard base64 decode of a speech payload into raw PCM bytes.
pub fn decode_base64_to_pcm(payload: &str) -> VoiceResult<Vec<u8>> {
    PCM_BASE64
        .decode(payload.trim())
        .map_err(|e| VoiceError::Codec(format!("base64 decode failed: {}", e)))
}

/// Reinterpret PCM16LE bytes as normalized float samples, deinterleaved by channel.
///
/// Each sample is divided by 32768. A trailing odd byte and any samples that
/// do not complete a full frame across all channels are dropped.
pub fn pcm_to_audio_buffer(bytes: &[u8], sample_rate: u32, channels: u16) -> VoiceResult<AudioBuffer> {
    if channels == 0 {
        return Err(VoiceError::Codec("channel count must be at least 1".to_string()));
    }
    let channel_count = channels as usize;
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let frames = samples.len() / channel_count;

    let channels = (0..channel_count)
        .map(|channel| {
            (0..frames)
                .map(|i| samples[i * channel_count + channel] as f32 / 32768.0)
                .collect()
        })
        .collect();

    Ok(AudioBuffer {
        sample_rate,
        channels,
    })
}

/// Encode f32 PCM (mono) to 16-bit WAV bytes for transcription upload.
pub fn pcm_f32_to_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let file_len = 44 + data_len;

    let mut buf = Vec::with_capacity(file_len as usize);
    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(file_len - 8).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    // fmt subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    // data subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let i = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        buf.extend_from_slice(&i.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bytes_map_to_known_samples() {
        // 0, 16384, -32768, 32767
        let bytes = [0x00, 0x00, 0x00, 0x40, 0x00, 0x80, 0xff, 0x7f];
        let buffer = pcm_to_audio_buffer(&bytes, DEFAULT_SAMPLE_RATE, 1).unwrap();
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.channels[0], vec![0.0, 0.5, -1.0, 32767.0 / 32768.0]);
    }

    #[test]
    fn stereo_is_deinterleaved_and_partial_frame_dropped() {
        // L=1, R=2, L=3, R=4, L=5 (incomplete frame)
        let samples: [i16; 5] = [1, 2, 3, 4, 5];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let buffer = pcm_to_audio_buffer(&bytes, 48_000, 2).unwrap();
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channels[0], vec![1.0 / 32768.0, 3.0 / 32768.0]);
        assert_eq!(buffer.channels[1], vec![2.0 / 32768.0, 4.0 / 32768.0]);
        assert_eq!(buffer.interleaved().len(), 4);
    }

    #[test]
    fn odd_trailing_byte_is_ignored() {
        let buffer = pcm_to_audio_buffer(&[0x00, 0x40, 0x7f], DEFAULT_SAMPLE_RATE, 1).unwrap();
        assert_eq!(buffer.channels[0], vec![0.5]);
    }

    #[test]
    fn zero_channels_rejected() {
        assert!(pcm_to_audio_buffer(&[0, 0], DEFAULT_SAMPLE_RATE, 0).is_err());
    }

    #[test]
    fn base64_with_and_without_padding() {
        assert_eq!(decode_base64_to_pcm("AABA").unwrap(), vec![0x00, 0x00, 0x40]);
        assert_eq!(decode_base64_to_pcm("AEA=").unwrap(), vec![0x00, 0x40]);
        assert_eq!(decode_base64_to_pcm("AEA").unwrap(), vec![0x00, 0x40]);
        assert!(decode_base64_to_pcm("not base64!").is_err());
    }

    #[test]
    fn duration_follows_sample_rate() {
        let bytes = vec![0u8; 48_000];
        let buffer = pcm_to_audio_buffer(&bytes, DEFAULT_SAMPLE_RATE, 1).unwrap();
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }

    #[test]
    fn wav_header_is_44_bytes() {
        let wav = pcm_f32_to_wav(&[0.0; 10], 16000);
        assert_eq!(wav.len(), 44 + 20);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }
}
