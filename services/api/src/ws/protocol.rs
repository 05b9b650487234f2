//! Defines the WebSocket message protocol between the browser client and the
//! relay.
//!
//! Inbound messages are raw text frames, one utterance each, so there is no
//! client-side message enum. Outbound messages interleave JSON text events
//! with one binary audio frame per successful exchange; audio always follows
//! the text event of the same exchange.

use bytes::Bytes;
use serde::Serialize;

/// JSON events sent to the client as text frames.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// The assistant's textual reply for one exchange.
    Text { content: String },
    /// Reports a failure to the client; the connection stays open.
    Error { message: String },
}

/// One outbound WebSocket frame, in the order the relay must send them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Event(ServerEvent),
    /// The complete synthesized utterance, sent as a single binary frame.
    Audio(Bytes),
}
