//! Dashboard server command — `taskdeck serve`.

use anyhow::Result;
use std::sync::Arc;

use taskdeck::config::DeckConfig;
use taskdeck::dashboard::{ServerConfig, start_server};
use taskdeck::review::{HttpReviewBackend, ReviewController};

pub async fn cmd_serve(config: &DeckConfig, port: u16, open: bool, dev: bool) -> Result<()> {
    // Skip in dev mode (no browser inside containers)
    if open && !dev {
        let url = format!("http://localhost:{}/api/reviews", port);
        tokio::spawn(async move {
            // Small delay to let the server start binding
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                eprintln!("Failed to open browser: {}", e);
            }
        });
    }

    let backend = Arc::new(HttpReviewBackend::new(config.api_base()));
    let controller = ReviewController::new(backend, config.timings());

    start_server(ServerConfig { port, dev_mode: dev }, controller).await
}
