//! Edge read-aloud synthesis over its WebSocket protocol.
//!
//! Each synthesis call opens a fresh connection, sends an audio configuration
//! frame followed by the SSML for the utterance, then drains the reply
//! stream. Binary frames whose headers carry `Path:audio` hold waveform
//! fragments; text frames carry handshake and timing data; `turn.end` marks
//! the utterance as fully synthesized.

use super::{SpeechSynthesizer, SynthesisChunk, SynthesisError, collect_audio};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::debug;
use uuid::Uuid;

const EDGE_TTS_URL: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";
/// Public client token used by the Edge read-aloud endpoint.
const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";
/// A finished-file format, so the browser can play the buffer as-is.
const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// A `SpeechSynthesizer` backed by the Edge read-aloud service.
pub struct EdgeSynthesizer;

impl EdgeSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EdgeSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Bytes, SynthesisError> {
        let connection_id = new_request_id();
        let url = format!(
            "{EDGE_TTS_URL}?TrustedClientToken={TRUSTED_CLIENT_TOKEN}&ConnectionId={connection_id}"
        );

        let (ws_stream, _) = connect_async(url).await?;
        let (mut tts_tx, mut tts_rx) = ws_stream.split();

        tts_tx
            .send(WsMessage::Text(speech_config_message().into()))
            .await?;
        tts_tx
            .send(WsMessage::Text(
                ssml_message(&new_request_id(), text, voice).into(),
            ))
            .await?;

        let mut chunks = Vec::new();
        while let Some(frame) = tts_rx.next().await {
            match frame? {
                WsMessage::Text(payload) => match classify_text_frame(payload.as_str()) {
                    TextFrame::TurnEnd => break,
                    TextFrame::Metadata => chunks.push(SynthesisChunk::Metadata),
                    TextFrame::Other => {}
                },
                WsMessage::Binary(payload) => {
                    if let Some(audio) = parse_binary_frame(&payload)? {
                        chunks.push(SynthesisChunk::Audio(audio));
                    }
                }
                WsMessage::Close(close_frame) => {
                    debug!(?close_frame, "Speech service closed the connection.");
                    break;
                }
                _ => {}
            }
        }

        collect_audio(chunks)
    }
}

/// Classification of a text frame by its `Path` header.
enum TextFrame {
    /// The utterance is fully synthesized.
    TurnEnd,
    /// Boundary/timing data.
    Metadata,
    /// Handshake frames (`turn.start`, `response`).
    Other,
}

fn classify_text_frame(payload: &str) -> TextFrame {
    let headers = payload.split("\r\n\r\n").next().unwrap_or("");
    match frame_path(headers) {
        Some("turn.end") => TextFrame::TurnEnd,
        Some("audio.metadata") => TextFrame::Metadata,
        _ => TextFrame::Other,
    }
}

/// Extracts the payload of a binary frame: a two-byte big-endian header
/// length, the header block, then the body. Frames whose `Path` header is
/// not `audio` carry no waveform data.
fn parse_binary_frame(frame: &[u8]) -> Result<Option<Bytes>, SynthesisError> {
    if frame.len() < 2 {
        return Err(SynthesisError::Protocol(
            "binary frame shorter than its header length prefix".to_string(),
        ));
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let body_start = 2 + header_len;
    if frame.len() < body_start {
        return Err(SynthesisError::Protocol(format!(
            "binary frame truncated: header block of {} bytes exceeds frame of {} bytes",
            header_len,
            frame.len()
        )));
    }
    let headers = std::str::from_utf8(&frame[2..body_start]).map_err(|_| {
        SynthesisError::Protocol("binary frame headers are not valid UTF-8".to_string())
    })?;
    if frame_path(headers) == Some("audio") {
        Ok(Some(Bytes::copy_from_slice(&frame[body_start..])))
    } else {
        Ok(None)
    }
}

fn frame_path(headers: &str) -> Option<&str> {
    headers
        .lines()
        .find_map(|line| line.trim_end_matches('\r').strip_prefix("Path:"))
        .map(str::trim)
}

fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn timestamp() -> String {
    Utc::now()
        .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}

fn speech_config_message() -> String {
    let config = serde_json::json!({
        "context": {
            "synthesis": {
                "audio": {
                    "metadataoptions": {
                        "sentenceBoundaryEnabled": "false",
                        "wordBoundaryEnabled": "false"
                    },
                    "outputFormat": OUTPUT_FORMAT
                }
            }
        }
    });
    format!(
        "X-Timestamp:{}\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n{config}",
        timestamp()
    )
}

fn ssml_message(request_id: &str, text: &str, voice: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\nX-Timestamp:{}\r\nPath:ssml\r\n\r\n\
         <speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{voice}'>{}</voice></speak>",
        timestamp(),
        escape_ssml_text(text)
    )
}

/// SSML bodies are XML; the reply text must not break out of the element.
fn escape_ssml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
