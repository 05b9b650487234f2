//! Core logic for the Docent exhibition guide.
//!
//! This crate holds everything independent of the web service: the chat
//! provider client, the per-connection conversation session, the speech
//! synthesis adapter, and the exhibition context loader. The `docent-api`
//! service wires these together behind a WebSocket relay.

pub mod chat;
pub mod context;
pub mod session;
pub mod tts;
