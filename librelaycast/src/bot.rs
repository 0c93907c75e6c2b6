//! Admin command front-end
//!
//! Long-polls Telegram for messages. Only the configured admin can issue
//! commands; everything else is dropped without a reply.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::messaging::telegram::{Message, TelegramClient, Update};
use crate::publisher::Publisher;
use crate::scheduler::{sleep_unless_shutdown, Scheduler, StartOutcome};

pub const STARTED_REPLY: &str = "⚡ Bot started. Posts are published on schedule.";
pub const ALREADY_RUNNING_REPLY: &str = "Posting is already running.";

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(25);
const RETRY_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
}

/// Recognize a bot command in message text.
///
/// Accepts the `/cmd@botname` form Telegram uses in group chats; trailing
/// arguments are ignored.
pub fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    match name {
        "start" => Some(Command::Start),
        "status" => Some(Command::Status),
        _ => None,
    }
}

pub struct Bot {
    client: Arc<TelegramClient>,
    admin_id: i64,
    publisher: Publisher,
    scheduler: Arc<Scheduler>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    poll_timeout: Duration,
}

impl Bot {
    pub fn new(
        client: Arc<TelegramClient>,
        admin_id: i64,
        publisher: Publisher,
        scheduler: Arc<Scheduler>,
        interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            client,
            admin_id,
            publisher,
            scheduler,
            interval,
            shutdown,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Reply text for an incoming message, or `None` if it should be ignored
    pub async fn respond(&self, message: &Message) -> Result<Option<String>> {
        let Some(command) = message.text.as_deref().and_then(parse_command) else {
            return Ok(None);
        };

        let sender = message.from.as_ref().map(|u| u.id);
        if sender != Some(self.admin_id) {
            debug!(sender = ?sender, command = ?command, "Ignoring command from non-admin");
            return Ok(None);
        }

        let reply = match command {
            Command::Start => {
                match self
                    .scheduler
                    .start(self.publisher.clone(), self.interval)
                    .await
                {
                    StartOutcome::Started => STARTED_REPLY.to_string(),
                    StartOutcome::AlreadyRunning => ALREADY_RUNNING_REPLY.to_string(),
                }
            }
            Command::Status => {
                let stats = self.publisher.database().stats().await?;
                let state = if self.scheduler.is_running().await {
                    "running"
                } else {
                    "stopped"
                };
                format!(
                    "Queue: {} pending, {} sent. Publishing loop: {}.",
                    stats.pending, stats.sent, state
                )
            }
        };

        Ok(Some(reply))
    }

    /// Handle one update, replying in the chat it came from
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = &update.message else {
            return Ok(());
        };

        if let Some(reply) = self.respond(message).await? {
            self.client.send_message(message.chat.id, &reply).await?;
        }
        Ok(())
    }

    /// Poll for updates until shutdown is requested
    pub async fn run(&self) -> Result<()> {
        let mut offset = 0;
        info!(admin_id = self.admin_id, "Listening for admin commands");

        while !self.shutdown.load(Ordering::Relaxed) {
            let updates = tokio::select! {
                result = self.client.get_updates(offset, self.poll_timeout) => result,
                _ = wait_for_shutdown(&self.shutdown) => break,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Polling for updates failed, retrying");
                    sleep_unless_shutdown(RETRY_PAUSE, &self.shutdown).await;
                    continue;
                }
            };

            for update in &updates {
                offset = offset.max(update.update_id + 1);
                if let Err(e) = self.handle_update(update).await {
                    warn!(update_id = update.update_id, error = %e, "Failed to handle update");
                }
            }
        }

        info!("Command listener stopped");
        Ok(())
    }
}

async fn wait_for_shutdown(shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        sleep(Duration::from_millis(250)).await;
    }
}
