//! Admin web interface for ad banners and astrology reports.
//!
//! Provides a server-rendered dashboard, a JSON API for banner and zone
//! management, ad analytics, and PDF/HTML report downloads.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use supabase_rest::SupabaseClient;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, supabase = %config.supabase.url, "Starting admin web server");

    // Connect to Supabase
    let client = SupabaseClient::new(config.supabase.clone())?;
    if !client.health_check().await.unwrap_or(false) {
        tracing::warn!("Supabase health check failed, continuing anyway");
    }

    // Build application state
    let state = AppState::new(Arc::new(client), config.ads.clone(), config.export.clone());

    // Build router
    let app = routes::router()
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Admin web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
