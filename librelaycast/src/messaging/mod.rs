//! Outbound messaging
//!
//! The publisher only needs "deliver text to a destination id"; the bot
//! front-end additionally long-polls [`telegram::TelegramClient`] for
//! incoming commands.

use async_trait::async_trait;

use crate::error::Result;

pub mod telegram;

// Available for all builds so the binaries' integration tests can use it
pub mod mock;

pub use telegram::TelegramClient;

/// Telegram rejects message bodies longer than this many characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver `text` to `chat_id`. Fails on any platform or transport error.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Cut `text` to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
