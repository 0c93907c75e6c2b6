//! Core types for Relaycast

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Format used for `created_at` columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time formatted for storage
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Queue status. `Sent` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    New,
    Sent,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::New => "new",
            PostStatus::Sent => "sent",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(PostStatus::New),
            "sent" => Ok(PostStatus::Sent),
            _ => Err(format!("Invalid status: '{}'. Valid options: new, sent", s)),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the durable queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedPost {
    pub id: i64,
    pub account: String,
    /// Source platform's identifier, unique across the store
    pub external_id: String,
    pub text: String,
    pub status: PostStatus,
    /// Local discovery time, not the original publish time
    pub created_at: String,
}

/// A post extracted from a rendered profile page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapedPost {
    pub external_id: String,
    pub text: String,
    pub created_at: String,
}

impl ScrapedPost {
    pub fn new(external_id: impl Into<String>, text: impl Into<String>, created_at: &str) -> Self {
        Self {
            external_id: external_id.into(),
            text: text.into(),
            created_at: created_at.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: i64,
    pub sent: i64,
}

impl QueueStats {
    pub fn total(&self) -> i64 {
        self.pending + self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("new".parse::<PostStatus>().unwrap(), PostStatus::New);
        assert_eq!("SENT".parse::<PostStatus>().unwrap(), PostStatus::Sent);
        assert!("posted".parse::<PostStatus>().is_err());
        assert_eq!(PostStatus::Sent.to_string(), "sent");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PostStatus::New).unwrap();
        assert_eq!(json, "\"new\"");
    }

    #[test]
    fn test_now_timestamp_format() {
        let ts = now_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_stats_total() {
        let stats = QueueStats { pending: 3, sent: 4 };
        assert_eq!(stats.total(), 7);
    }
}
