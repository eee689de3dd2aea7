//! Tickdown - a state-managed HTTP countdown timer with audible warning cues
//!
//! This is the main entry point for the tickdown application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use tickdown::{
    api::create_router,
    audio::build_cue_sink,
    config::Config,
    state::AppState,
    tasks::countdown_ticker_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("tickdown={},tower_http=info", config.log_level()))
        .init();

    info!("Starting tickdown server v0.1.0");
    info!(
        "Configuration: host={}, port={}, default duration={}min, muted={}",
        config.host, config.port, config.duration, config.muted
    );

    // Audio failures never prevent startup, the countdown degrades to silence
    let cue_sink = build_cue_sink(&config);

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.duration_seconds(),
        cue_sink,
    ));

    // Start the countdown tick source background task
    let ticker_state = Arc::clone(&state);
    tokio::spawn(async move {
        countdown_ticker_task(ticker_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /digit/:d - Press a keypad digit");
    info!("  POST /delete   - Remove the last pending digit");
    info!("  POST /clear    - Clear pending input");
    info!("  POST /toggle   - Start, pause, or resume the countdown");
    info!("  POST /reset    - Reset to the configured duration");
    info!("  GET  /status   - Current widget state and timer");
    info!("  GET  /health   - Health check");

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

    info!("Server shutdown complete");
    Ok(())
}
