mod analysis;
mod chat;
mod config;
mod document;
mod errors;
mod llm_client;
mod routes;
mod state;
mod videos;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::Pipeline;
use crate::config::Config;
use crate::document::{PageRasterizer, PdfiumRasterizer, UnavailableRasterizer};
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::videos::YouTubeClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));
    config.warn_missing_secrets();

    let llm = GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let videos = YouTubeClient::new(config.youtube_api_key.clone(), config.youtube_base_url.clone())?;
    info!("Video search client initialized (max results: {})", config.max_video_results);

    let rasterizer: Arc<dyn PageRasterizer> =
        match PdfiumRasterizer::new(config.pdfium_library_path.as_deref()) {
            Ok(rasterizer) => {
                info!("pdfium bound; image extraction enabled");
                Arc::new(rasterizer)
            }
            Err(e) => {
                warn!("{e}; image extraction requests will fail until pdfium is installed");
                Arc::new(UnavailableRasterizer::new(e.to_string()))
            }
        };

    let state = AppState {
        pipeline: Pipeline {
            llm: Arc::new(llm),
            videos: Arc::new(videos),
            rasterizer,
            max_video_results: config.max_video_results,
        },
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
