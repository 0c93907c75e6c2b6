//! Profile scraping
//!
//! One collection pass walks the configured accounts strictly in order. Each
//! account gets its own browser session which is closed whether or not the
//! render succeeded; a failing account is logged and yields no posts.

use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::CollectorConfig;
use crate::db::Database;
use crate::error::Result;
use crate::types::{now_timestamp, ScrapedPost};

pub mod browser;
pub mod extract;
pub mod mock;

pub use browser::{Browser, BrowserSession, BrowserlessBrowser};
pub use extract::{extract_posts, ExtractedPost};

/// Outcome of a collection pass over all accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub accounts: usize,
    pub scraped: usize,
    pub inserted: u64,
}

pub struct Collector {
    browser: Arc<dyn Browser>,
    base_url: String,
    settle: Duration,
    shutdown: Option<Arc<AtomicBool>>,
}

impl Collector {
    pub fn new(browser: Arc<dyn Browser>, config: &CollectorConfig) -> Self {
        Self {
            browser,
            base_url: config.base_url.clone(),
            settle: Duration::from_millis(config.settle_ms),
            shutdown: None,
        }
    }

    /// Stop a pass between accounts once `shutdown` is set
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Profile URL for `account`, resolved like a relative link against the base
    pub fn profile_url(&self, account: &str) -> String {
        Url::parse(&self.base_url)
            .and_then(|base| base.join(account))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}/{}", self.base_url.trim_end_matches('/'), account))
    }

    /// Scrape one account. Errors are logged and produce an empty batch.
    pub async fn collect(&self, account: &str) -> Vec<ScrapedPost> {
        match self.try_collect(account).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(account = %account, error = %e, "Failed to collect posts");
                Vec::new()
            }
        }
    }

    async fn try_collect(&self, account: &str) -> Result<Vec<ScrapedPost>> {
        let url = self.profile_url(account);
        let mut session = self.browser.open_session().await?;

        let rendered = session.render(&url, self.settle).await;
        session.close().await;
        let html = rendered?;

        // One discovery timestamp for the whole batch
        let now = now_timestamp();
        Ok(extract_posts(&html)
            .into_iter()
            .map(|p| ScrapedPost::new(p.external_id, p.text, &now))
            .collect())
    }

    /// Run one collection pass and queue everything found.
    ///
    /// Storage failures propagate; scrape failures do not.
    pub async fn collect_all(&self, accounts: &[String], db: &Database) -> Result<CollectionSummary> {
        let mut summary = CollectionSummary::default();

        for account in accounts {
            if self.shutdown_requested() {
                info!(
                    remaining = accounts.len() - summary.accounts,
                    "Shutdown requested, stopping collection pass"
                );
                break;
            }

            let posts = self.collect(account).await;
            let inserted = db.insert_many(account, &posts).await?;

            info!(
                account = %account,
                scraped = posts.len(),
                inserted,
                "Collected posts"
            );

            summary.accounts += 1;
            summary.scraped += posts.len();
            summary.inserted += inserted;
        }

        Ok(summary)
    }
}
