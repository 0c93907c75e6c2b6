//! In-memory messenger that records deliveries

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{DeliveryError, Result};
use crate::messaging::Messenger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
}

#[derive(Clone, Default)]
pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failure: Arc<Mutex<Option<String>>>,
    attempts: Arc<Mutex<usize>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messenger whose every send fails with `description`
    pub fn failing(description: &str) -> Self {
        let messenger = Self::default();
        messenger.set_failure(Some(description));
        messenger
    }

    /// Switch failure mode on (`Some`) or off (`None`)
    pub fn set_failure(&self, description: Option<&str>) {
        *self.failure.lock().unwrap() = description.map(String::from);
    }

    /// Successfully delivered messages, in order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Every call to `send_text`, failed ones included
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;

        if let Some(description) = self.failure.lock().unwrap().clone() {
            return Err(DeliveryError::Api {
                code: 400,
                description,
            }
            .into());
        }

        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }
}
