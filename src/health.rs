//! Liveness endpoint for hosts that ping the process over HTTP.

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    "✅ Bot is active!"
}

/// Serves until `shutdown` is cancelled. Bind and serve failures are logged;
/// the bot keeps running without the endpoint.
pub async fn serve(addr: String, shutdown: CancellationToken) {
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::warn!("Health endpoint disabled, could not bind {}: {}", addr, e);
            return;
        }
    };
    log::info!("Health endpoint listening on {}", addr);

    if let Err(e) = axum::serve(listener, router())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        log::warn!("Health endpoint stopped: {}", e);
    }
}
