//! Main Entrypoint for the Docent API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Loading the exhibition context document.
//! 4. Initializing shared services (chat client and speech synthesizer).
//! 5. Constructing the Axum router and applying middleware.
//! 6. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use docent_api::{config::Config, router::create_router, state::AppState};
use docent_core::{
    chat::{ChatClient, OpenAICompatibleClient},
    context,
    tts::{EdgeSynthesizer, SpeechSynthesizer},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Gemini's OpenAI-compatible chat completion endpoint.
const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Load the Exhibition Context ---
    let exhibition_context = context::load_exhibition_context(&config.exhibition_data_path);
    let system_instruction = Arc::new(context::build_system_instruction(&exhibition_context));

    // --- 4. Initialize Shared Services ---
    // A missing credential is not fatal: the relay reports it per utterance.
    let chat_client: Option<Arc<dyn ChatClient>> = match &config.gemini_api_key {
        Some(api_key) => {
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(GEMINI_OPENAI_BASE);
            Some(Arc::new(OpenAICompatibleClient::new(
                openai_config,
                config.chat_model.clone(),
            )))
        }
        None => {
            error!("GEMINI_API_KEY environment variable not set!");
            None
        }
    };

    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(EdgeSynthesizer::new());

    let app_state = Arc::new(AppState {
        chat_client,
        synthesizer,
        system_instruction,
        config: Arc::new(config.clone()),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        model = %config.chat_model,
        voice = %config.tts_voice,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
