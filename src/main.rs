use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use afgm::activity::JsonActivityStore;
use afgm::client::Client;
use afgm::commands::standard_router;
use afgm::config::Config;
use afgm::dispatch::Dispatcher;
use afgm::health;
use afgm::http::Http;
use afgm::state::BotState;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Lets the reboot reply and other in-flight handlers finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Both reqwest and tungstenite go through rustls; pick the provider once.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let http = match Http::new(&config.token, config.api_url.clone()) {
        Ok(http) => Arc::new(http),
        Err(e) => {
            log::error!("❗ {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = Arc::new(JsonActivityStore::open(config.data_file.clone()).await);
    let state = Arc::new(BotState::new(config));

    if let Some(addr) = state.config.health_addr.clone() {
        tokio::spawn(health::serve(addr, state.shutdown.clone()));
    }

    let dispatcher = Dispatcher::new(
        http.clone(),
        store,
        state.clone(),
        standard_router(&state.config),
    );
    let mut client = match Client::builder(state.config.token.as_str())
        .http(http)
        .event_handler(dispatcher)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, shutting down");
            shutdown.cancel();
        }
    });

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            result = client.start() => match result {
                Ok(()) => log::info!("Gateway stream ended, reconnecting"),
                Err(e) => log::warn!("Gateway session ended: {}", e),
            },
        }
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }

    tokio::time::sleep(SHUTDOWN_GRACE).await;

    if state.reboot_requested() {
        return restart();
    }
    ExitCode::SUCCESS
}

/// Starts a fresh copy of this binary with the same arguments.
fn restart() -> ExitCode {
    let spawned = std::env::current_exe()
        .and_then(|exe| std::process::Command::new(exe).args(std::env::args_os().skip(1)).spawn());
    match spawned {
        Ok(child) => {
            log::info!("Restarted as pid {}", child.id());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Could not restart: {}", e);
            ExitCode::FAILURE
        }
    }
}
