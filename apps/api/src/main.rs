mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::extractor::PdfExtractor;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing credentials are fatal here, before any analysis can be attempted
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-ats v{}", env!("CARGO_PKG_VERSION"));

    let llm = GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_base_url.clone(),
        config.gemini_model.clone(),
        config.llm_timeout_secs.map(Duration::from_secs),
    )?;
    info!("Completion client configured (model: {})", llm.model());

    let pipeline = AnalysisPipeline::new(Arc::new(PdfExtractor), Arc::new(llm));

    let state = AppState {
        pipeline,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
