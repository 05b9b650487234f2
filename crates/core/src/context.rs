//! Exhibition Context
//!
//! Loads the static knowledge document once at startup and folds it into the
//! model's fixed system instruction.

use std::path::Path;
use tracing::warn;

/// Reads the exhibition knowledge document.
///
/// A missing document is not fatal: the guide runs with an empty context and
/// a warning is logged.
pub fn load_exhibition_context(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Exhibition data not found. Using empty context."
            );
            String::new()
        }
    }
}

/// Builds the fixed system instruction for the guide persona.
///
/// The instruction keeps replies short because they are spoken out loud by
/// the synthesizer.
pub fn build_system_instruction(exhibition_context: &str) -> String {
    format!(
        "You are an intelligent and friendly AI guide for a Computer Science Exhibition.\n\
         Your goal is to engage with visitors, answer their questions about the exhibition, and provide interesting facts.\n\
         You are helpful, concise, and enthusiastic.\n\
         Use the following information about the exhibition to answer questions:\n\
         \n\
         {exhibition_context}\n\
         \n\
         If a visitor asks something outside this context, politely steer them back to the exhibition or answer briefly if it's a general CS question.\n\
         Keep your responses relatively short (1-3 sentences) as they will be spoken out loud."
    )
}
