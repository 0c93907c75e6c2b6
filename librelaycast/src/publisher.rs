//! One publishing step: dequeue, translate, deliver, mark sent

use std::sync::Arc;
use tracing::{error, info};

use crate::db::Database;
use crate::error::Result;
use crate::messaging::Messenger;
use crate::translator::Translate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Queue had nothing pending
    Idle,
    /// Record was delivered and marked sent
    Sent { id: i64 },
    /// Delivery failed; the record stays pending for the next cycle
    DeliveryFailed { id: i64 },
}

#[derive(Clone)]
pub struct Publisher {
    db: Database,
    translator: Arc<dyn Translate>,
    messenger: Arc<dyn Messenger>,
    channel_id: i64,
}

impl Publisher {
    pub fn new(
        db: Database,
        translator: Arc<dyn Translate>,
        messenger: Arc<dyn Messenger>,
        channel_id: i64,
    ) -> Self {
        Self {
            db,
            translator,
            messenger,
            channel_id,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Publish at most one pending record.
    ///
    /// Translation and delivery failures are absorbed here; only storage
    /// errors are returned.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Some(post) = self.db.next_pending().await? else {
            info!("No new posts to publish");
            return Ok(CycleOutcome::Idle);
        };

        let translated = self.translator.translate(&post.text).await;

        if let Err(e) = self.messenger.send_text(self.channel_id, &translated).await {
            error!(id = post.id, account = %post.account, error = %e, "Failed to deliver post");
            return Ok(CycleOutcome::DeliveryFailed { id: post.id });
        }

        self.db.mark_sent(post.id).await?;
        info!(id = post.id, account = %post.account, "Post published");

        Ok(CycleOutcome::Sent { id: post.id })
    }
}
