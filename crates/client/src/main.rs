use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod interpreter;
mod panels;
mod service;
mod studio;

use config::Config;
use interpreter::ActionInterpreter;
use service::http::HttpMediaService;
use studio::Studio;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);
    info!("Media API at {}", config.api_base_url);

    let service = Arc::new(HttpMediaService::new(config.clone())?);
    let studio = Studio::start(config.clone(), service);
    let interpreter = Arc::new(ActionInterpreter::new(studio.clone()));

    // Initial library load; the worker applies it in the background
    studio.panels().request_refresh();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api::router(api::AppState { studio, interpreter }))
        .layer(cors);

    info!("Starting studio server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
