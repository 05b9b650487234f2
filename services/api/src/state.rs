//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the chat client, the speech synthesizer, and the
//! fixed system instruction.

use crate::config::Config;
use docent_core::{chat::ChatClient, tts::SpeechSynthesizer};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no chat credential is configured. The relay then answers
    /// every utterance with an error event instead of calling the provider.
    pub chat_client: Option<Arc<dyn ChatClient>>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub system_instruction: Arc<String>,
    pub config: Arc<Config>,
}
