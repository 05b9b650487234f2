//! Speech Synthesis
//!
//! Converts reply text into a complete audio rendering via a remote voice
//! service. Structured into submodules:
//!
//! - `edge`: the Edge read-aloud WebSocket protocol implementation.
//!
//! The relay only depends on the `SpeechSynthesizer` trait, so tests can
//! substitute a local stub.

pub mod edge;

pub use edge::EdgeSynthesizer;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

/// The voice used when no other voice is configured.
pub const DEFAULT_VOICE: &str = "en-US-AriaNeural";

/// Errors produced by a remote synthesis call.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The WebSocket connection to the speech service failed.
    #[error("speech service connection failed: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    /// The service sent a frame that does not follow its protocol.
    #[error("speech service sent a malformed frame: {0}")]
    Protocol(String),
    /// The reply stream ended without a single audio chunk.
    #[error("speech service returned no audio")]
    NoAudio,
}

/// One frame of a synthesis reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisChunk {
    /// A fragment of the synthesized waveform.
    Audio(Bytes),
    /// A non-audio frame (boundary timings and similar); never part of the
    /// returned buffer.
    Metadata,
}

/// Converts text to a complete audio rendering via a remote voice service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` with the given voice.
    ///
    /// Returns only after the full utterance is synthesized, as one
    /// contiguous buffer.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Bytes, SynthesisError>;
}

/// Concatenates the audio-tagged chunks of a reply stream in order,
/// discarding metadata chunks.
pub fn collect_audio(chunks: Vec<SynthesisChunk>) -> Result<Bytes, SynthesisError> {
    let mut buffer = BytesMut::new();
    let mut saw_audio = false;
    for chunk in chunks {
        if let SynthesisChunk::Audio(data) = chunk {
            buffer.extend_from_slice(&data);
            saw_audio = true;
        }
    }
    if !saw_audio {
        return Err(SynthesisError::NoAudio);
    }
    Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_audio_concatenates_audio_chunks_in_order() {
        let chunks = vec![
            SynthesisChunk::Audio(Bytes::from_static(b"one")),
            SynthesisChunk::Audio(Bytes::from_static(b"two")),
            SynthesisChunk::Metadata,
            SynthesisChunk::Audio(Bytes::from_static(b"three")),
        ];
        let audio = collect_audio(chunks).unwrap();
        assert_eq!(&audio[..], b"onetwothree");
    }

    #[test]
    fn collect_audio_without_audio_chunks_is_an_error() {
        let err = collect_audio(vec![SynthesisChunk::Metadata]).unwrap_err();
        assert!(matches!(err, SynthesisError::NoAudio));

        let err = collect_audio(Vec::new()).unwrap_err();
        assert!(matches!(err, SynthesisError::NoAudio));
    }
}
