//! Docent API Library Crate
//!
//! This library contains the web-facing logic for the Docent exhibition
//! guide: application state, configuration, the static-page handler, the
//! WebSocket relay, and routing. The `api` binary is a thin wrapper around
//! this library.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;
