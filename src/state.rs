use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Process-wide state shared by the dispatcher, the commands and `main`.
pub struct BotState {
    pub config: Config,
    pub started_at: Instant,
    /// Cancelled when the process should stop serving events.
    pub shutdown: CancellationToken,
    reboot: AtomicBool,
}

impl BotState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
            reboot: AtomicBool::new(false),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Asks `main` to stop the gateway and start a fresh copy of the process.
    pub fn request_reboot(&self) {
        self.reboot.store(true, Ordering::SeqCst);
        self.shutdown.cancel();
    }

    pub fn reboot_requested(&self) -> bool {
        self.reboot.load(Ordering::SeqCst)
    }
}
