mod web;

use flyercal::{startup, FlyerPipeline};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::web::{AppState, SessionStore};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting flyer to calendar web server");

    // Load configuration
    let config = startup::load_config()?;
    if config.default_credential().is_none() {
        warn!("OPENAI_API_KEY is not set, users must enter their own key");
    }

    let state = AppState {
        pipeline: FlyerPipeline::from_config(&config)?,
        sessions: Arc::new(SessionStore::new()),
    };
    let app = web::router(state, config.max_upload_bytes);

    // Bind to address and run server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| flyercal::error::config_error(&format!("Invalid HOST/PORT: {}", e)))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(flyercal::error::Error::from)?;
    axum::serve(listener, app)
        .await
        .map_err(flyercal::error::Error::from)?;

    Ok(())
}
