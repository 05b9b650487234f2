//! WebSocket Relay
//!
//! This module contains the logic for relaying visitor utterances between
//! the browser and the remote services. It is structured into submodules:
//!
//! - `protocol`: Defines the JSON-based message format sent to the client.
//! - `relay`: Manages the connection lifecycle and the per-utterance
//!   receive → chat → synthesize → send pipeline.

pub mod protocol;
pub mod relay;

pub use relay::ws_handler;
