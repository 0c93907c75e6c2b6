//! Relaycast - relay public X posts into a Telegram channel
//!
//! Profiles are scraped into a durable SQLite queue, then published one at a
//! time on a fixed interval: each pending post is translated through a
//! chat-completion API and delivered to the configured channel.

pub mod bot;
pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod publisher;
pub mod scheduler;
pub mod translator;
pub mod types;

// Re-export commonly used types
pub use bot::Bot;
pub use collector::{CollectionSummary, Collector};
pub use config::Config;
pub use db::Database;
pub use error::{RelaycastError, Result};
pub use messaging::{Messenger, TelegramClient};
pub use publisher::{CycleOutcome, Publisher};
pub use scheduler::{Scheduler, StartOutcome};
pub use translator::{OpenRouterTranslator, Translate};
pub use types::{PostStatus, QueueStats, QueuedPost, ScrapedPost};
