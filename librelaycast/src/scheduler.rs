//! Periodic publishing loop with a start-once guard
//!
//! At most one loop runs per [`Scheduler`]. The loop checks a shared
//! shutdown flag between cycles and while sleeping, waking at least once a
//! second.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use crate::publisher::Publisher;

/// Longest uninterrupted sleep between shutdown checks
const SLEEP_SLICE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

pub struct Scheduler {
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(shutdown: Arc<AtomicBool>) -> Self {
        Self {
            handle: Mutex::new(None),
            shutdown,
        }
    }

    /// Spawn the publishing loop unless one is already active.
    ///
    /// A loop that has already finished (after shutdown or a panic) does not
    /// block a new start.
    pub async fn start(&self, publisher: Publisher, interval: Duration) -> StartOutcome {
        let mut slot = self.handle.lock().await;

        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return StartOutcome::AlreadyRunning;
        }

        info!(interval = %humantime::format_duration(interval), "Starting publishing loop");
        let shutdown = Arc::clone(&self.shutdown);
        *slot = Some(tokio::spawn(run_loop(publisher, interval, shutdown)));

        StartOutcome::Started
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Wait for the current loop (if any) to exit. Call after setting the
    /// shutdown flag.
    pub async fn join(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Publishing loop terminated abnormally");
            }
        }
    }
}

async fn run_loop(publisher: Publisher, interval: Duration, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping publishing loop");
            break;
        }

        // Storage errors end this cycle, not the loop
        if let Err(e) = publisher.run_cycle().await {
            error!(error = %e, "Publishing cycle failed");
        }

        sleep_unless_shutdown(interval, &shutdown).await;
    }
}

/// Sleep for `total`, returning early once `shutdown` is set
pub(crate) async fn sleep_unless_shutdown(total: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + total;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        sleep((deadline - now).min(SLEEP_SLICE)).await;
    }
}
