mod config;
mod document;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod session;
mod speech;
mod state;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GenerationClient, TextGenerator};
use crate::routes::build_router;
use crate::speech::{DeepgramClient, SpeechBridge};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the generation client
    let llm: Arc<dyn TextGenerator> =
        Arc::new(GenerationClient::new(config.generation_url.clone()));
    info!("Generation client initialized (model: {})", llm_client::MODEL);

    // Initialize the speech bridge
    let speech: Arc<dyn SpeechBridge> =
        Arc::new(DeepgramClient::new(config.deepgram_api_key.clone()));
    info!("Speech client initialized");

    // Build app state
    let state = AppState {
        llm,
        speech,
        interviews: Arc::new(Mutex::new(HashMap::new())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
