//! Manages the relay WebSocket connection lifecycle.
//!
//! Each connection gets its own task and its own `ConversationSession`.
//! Processing is strictly sequential (half-duplex): the handler waits for an
//! utterance, relays it through chat and synthesis, sends the results, and
//! only then reads again. Remote failures are reported to the client and
//! never close the connection; only a client disconnect ends the session.

use super::protocol::{OutboundFrame, ServerEvent};
use crate::state::AppState;
use anyhow::Result;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use docent_core::{session::ConversationSession, tts::SpeechSynthesizer};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// The client-visible message sent when no chat credential is configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "API key not set on server.";

/// Axum handler to upgrade an HTTP connection to the relay WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for one visitor connection.
#[instrument(name = "relay", skip_all, fields(connection_id))]
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let connection_id: u32 = rand::random();
    tracing::Span::current().record("connection_id", connection_id.to_string());
    info!("WebSocket connected");

    let mut session = state
        .chat_client
        .clone()
        .map(|client| ConversationSession::new(client, state.system_instruction.clone()));

    while let Some(msg_result) = socket.recv().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(err) => {
                warn!(error = %err, "Error receiving from client. Closing session.");
                break;
            }
        };
        match msg {
            Message::Text(text) => {
                info!(utterance = %text, "Received utterance");
                let frames = process_utterance(
                    session.as_mut(),
                    state.synthesizer.as_ref(),
                    &state.config.tts_voice,
                    &text,
                )
                .await;
                if let Err(err) = send_frames(&mut socket, frames).await {
                    warn!(error = %err, "Client went away mid-send. Closing session.");
                    break;
                }
            }
            Message::Close(_) => break,
            // Binary and ping/pong frames from the client are not part of
            // the protocol.
            _ => {}
        }
    }

    info!("WebSocket disconnected");
}

/// Turns one utterance into the ordered frame sequence to send back.
///
/// `session` is `None` when no chat credential is configured; the utterance
/// is then answered with a fixed error event and no remote service is
/// contacted.
pub(crate) async fn process_utterance(
    session: Option<&mut ConversationSession>,
    synthesizer: &dyn SpeechSynthesizer,
    voice: &str,
    utterance: &str,
) -> Vec<OutboundFrame> {
    let Some(session) = session else {
        return vec![OutboundFrame::Event(ServerEvent::Error {
            message: MISSING_CREDENTIAL_MESSAGE.to_string(),
        })];
    };

    let reply = match session.reply(utterance).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(error = %err, "Chat call failed");
            return vec![OutboundFrame::Event(ServerEvent::Error {
                message: err.to_string(),
            })];
        }
    };
    info!(reply = %reply, "Model reply");

    let mut frames = vec![OutboundFrame::Event(ServerEvent::Text {
        content: reply.clone(),
    })];
    match synthesizer.synthesize(&reply, voice).await {
        Ok(audio) => frames.push(OutboundFrame::Audio(audio)),
        Err(err) => {
            error!(error = %err, "Synthesis failed");
            frames.push(OutboundFrame::Event(ServerEvent::Error {
                message: err.to_string(),
            }));
        }
    }
    frames
}

/// Serializes and sends the frames in order. A send failure means the client
/// is gone; the caller treats it as a disconnect.
async fn send_frames(socket: &mut WebSocket, frames: Vec<OutboundFrame>) -> Result<()> {
    for frame in frames {
        match frame {
            OutboundFrame::Event(event) => {
                let serialized = serde_json::to_string(&event)?;
                socket.send(Message::Text(serialized.into())).await?;
            }
            OutboundFrame::Audio(audio) => {
                socket.send(Message::Binary(audio)).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use docent_core::chat::{ChatClient, ChatProviderError};
    use docent_core::session::Turn;
    use docent_core::tts::SynthesisError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedReply(&'static str);

    #[async_trait]
    impl ChatClient for FixedReply {
        async fn complete(
            &self,
            _system_instruction: &str,
            _history: &[Turn],
            _utterance: &str,
        ) -> Result<String, ChatProviderError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatClient for FailingChat {
        async fn complete(
            &self,
            _system_instruction: &str,
            _history: &[Turn],
            _utterance: &str,
        ) -> Result<String, ChatProviderError> {
            Err(ChatProviderError::EmptyReply)
        }
    }

    /// Counts calls so tests can assert the synthesizer was never reached.
    struct CountingSynth {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSynth {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynth {
        async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Bytes, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SynthesisError::NoAudio)
            } else {
                Ok(Bytes::from_static(b"mp3-audio"))
            }
        }
    }

    fn session_with(client: impl ChatClient + 'static) -> ConversationSession {
        ConversationSession::new(
            Arc::new(client),
            Arc::new("You are an exhibition guide.".to_string()),
        )
    }

    #[tokio::test]
    async fn missing_credential_yields_one_fixed_error_and_no_remote_calls() {
        let synth = CountingSynth::succeeding();
        let frames = process_utterance(None, &synth, "en-US-AriaNeural", "hello").await;

        assert_eq!(
            frames,
            vec![OutboundFrame::Event(ServerEvent::Error {
                message: MISSING_CREDENTIAL_MESSAGE.to_string(),
            })]
        );
        assert_eq!(synth.calls(), 0);
    }

    #[tokio::test]
    async fn chat_failure_yields_one_error_no_audio_and_no_committed_turn() {
        let mut session = session_with(FailingChat);
        let synth = CountingSynth::succeeding();
        let frames =
            process_utterance(Some(&mut session), &synth, "en-US-AriaNeural", "hello").await;

        assert_eq!(frames.len(), 1);
        assert!(matches!(
            frames[0],
            OutboundFrame::Event(ServerEvent::Error { .. })
        ));
        assert_eq!(synth.calls(), 0);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn synthesis_failure_yields_text_then_error_and_no_audio() {
        let mut session = session_with(FixedReply("Over here we have Turing's machine."));
        let synth = CountingSynth::failing();
        let frames =
            process_utterance(Some(&mut session), &synth, "en-US-AriaNeural", "hello").await;

        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0],
            OutboundFrame::Event(ServerEvent::Text {
                content: "Over here we have Turing's machine.".to_string(),
            })
        );
        assert!(matches!(
            frames[1],
            OutboundFrame::Event(ServerEvent::Error { .. })
        ));
        // The exchange is still committed; only the audio is missing.
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn successful_exchange_yields_text_then_audio() {
        let mut session = session_with(FixedReply("This exhibit shows sorting algorithms."));
        let synth = CountingSynth::succeeding();
        let frames = process_utterance(
            Some(&mut session),
            &synth,
            "en-US-AriaNeural",
            "What is this exhibit about?",
        )
        .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0],
            OutboundFrame::Event(ServerEvent::Text {
                content: "This exhibit shows sorting algorithms.".to_string(),
            })
        );
        match &frames[1] {
            OutboundFrame::Audio(audio) => assert!(!audio.is_empty()),
            other => panic!("expected an audio frame, got {:?}", other),
        }
        assert_eq!(synth.calls(), 1);
    }

    #[tokio::test]
    async fn session_history_grows_across_utterances() {
        let mut session = session_with(FixedReply("Indeed!"));
        let synth = CountingSynth::succeeding();

        process_utterance(Some(&mut session), &synth, "en-US-AriaNeural", "first").await;
        process_utterance(Some(&mut session), &synth, "en-US-AriaNeural", "second").await;

        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[0], Turn::visitor("first"));
        assert_eq!(session.history()[2], Turn::visitor("second"));
    }
}
