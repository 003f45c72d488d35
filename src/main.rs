//! TimeBound - Demo backend for time-limited virtual cards
//! 
//! This is the main entry point for the timebound server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use timebound::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::spawn_expiry_listener,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timebound={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timebound server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, card={}min, fx_rate={}",
          config.host, config.port, config.card_minutes, config.fx_rate);

    config.validate()?;

    // Create application state
    let state = Arc::new(AppState::new(config.port, config.host.clone(), config.flow_settings()));

    // Start the card expiry listener
    let _listener = spawn_expiry_listener(Arc::clone(&state));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /                     - Landing content");
    info!("  GET  /catalog              - Platforms, purposes and badges");
    info!("  POST /payments             - Start a payment");
    info!("  GET  /payments/:id         - Payment status");
    info!("  POST /payments/:id/upi     - Simulate UPI confirmation");
    info!("  GET  /cards/:id            - Card details and countdown");
    info!("  POST /cards/:id/complete   - Mark card payment complete");
    info!("  POST /cards/:id/cancel     - Leave card and refund");
    info!("  GET  /dashboard            - Payment history");
    info!("  GET  /status               - Server status");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    match state.release_all_cards() {
        Ok(count) => info!("Released {} card timers", count),
        Err(e) => tracing::error!("Failed to release card timers: {}", e),
    }

    info!("Server shutdown complete");
    Ok(())
}
