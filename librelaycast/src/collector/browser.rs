//! Headless browser boundary
//!
//! A [`Browser`] hands out [`BrowserSession`]s; a session renders a page to
//! HTML after a settle delay and must be closed by whoever opened it.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

use crate::config::CollectorConfig;
use crate::error::{BrowserError, Result};

#[async_trait]
pub trait Browser: Send + Sync {
    /// Start a fresh browser session
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>>;
}

#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`, wait `settle` for dynamic content, return the rendered DOM
    async fn render(&mut self, url: &str, settle: Duration) -> Result<String>;

    /// Release the session. Called on every exit path.
    async fn close(self: Box<Self>);
}

/// Renders pages through a Browserless `/content` endpoint
pub struct BrowserlessBrowser {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl BrowserlessBrowser {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(BrowserError::from)?;

        Ok(Self {
            client,
            base_url: config.browserless_url.trim_end_matches('/').to_string(),
            token: config
                .browserless_token
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| SecretString::from(t.clone())),
        })
    }

    fn endpoint(&self) -> String {
        match &self.token {
            Some(token) => format!("{}/content?token={}", self.base_url, token.expose_secret()),
            None => format!("{}/content", self.base_url),
        }
    }
}

#[async_trait]
impl Browser for BrowserlessBrowser {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>> {
        debug!(base_url = %self.base_url, "Opening browserless session");
        Ok(Box::new(BrowserlessSession {
            client: self.client.clone(),
            endpoint: self.endpoint(),
        }))
    }
}

struct BrowserlessSession {
    client: reqwest::Client,
    endpoint: String,
}

impl BrowserlessSession {
    fn base_endpoint(&self) -> &str {
        self.endpoint.split('?').next().unwrap_or_default()
    }
}

#[async_trait]
impl BrowserSession for BrowserlessSession {
    async fn render(&mut self, url: &str, settle: Duration) -> Result<String> {
        let body = serde_json::json!({
            "url": url,
            "waitForTimeout": settle.as_millis() as u64,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(BrowserError::from)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserError::Render {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(resp.text().await.map_err(BrowserError::from)?)
    }

    async fn close(self: Box<Self>) {
        // Browserless tears the browser down once /content returns
        debug!(endpoint = %self.base_endpoint(), "Browserless session closed");
    }
}
