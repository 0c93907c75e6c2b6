//! Scriptable browser for exercising the collector without a real renderer
//!
//! Available in all builds so the binaries' integration tests can use it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collector::browser::{Browser, BrowserSession};
use crate::error::{BrowserError, Result};

#[derive(Debug, Clone)]
enum Page {
    Html(String),
    Fail(String),
}

#[derive(Debug, Default)]
struct Counters {
    opened: usize,
    closed: usize,
    rendered: Vec<String>,
}

/// Serves canned HTML per URL and records session lifecycle
#[derive(Clone, Default)]
pub struct MockBrowser {
    pages: Arc<Mutex<HashMap<String, Page>>>,
    fail_open: bool,
    counters: Arc<Mutex<Counters>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.set_page(url, html);
        self
    }

    /// Make rendering `url` fail with `message`
    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Page::Fail(message.to_string()));
        self
    }

    /// Make every `open_session` call fail
    pub fn failing_to_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Replace the page served for `url` (between collection passes)
    pub fn set_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Page::Html(html.to_string()));
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.lock().unwrap().opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.counters.lock().unwrap().closed
    }

    pub fn rendered_urls(&self) -> Vec<String> {
        self.counters.lock().unwrap().rendered.clone()
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_open {
            return Err(BrowserError::Session("mock browser refused to start".to_string()).into());
        }

        self.counters.lock().unwrap().opened += 1;
        Ok(Box::new(MockSession {
            pages: Arc::clone(&self.pages),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockSession {
    pages: Arc<Mutex<HashMap<String, Page>>>,
    counters: Arc<Mutex<Counters>>,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn render(&mut self, url: &str, _settle: Duration) -> Result<String> {
        self.counters.lock().unwrap().rendered.push(url.to_string());

        let page = self.pages.lock().unwrap().get(url).cloned();
        match page {
            Some(Page::Html(html)) => Ok(html),
            Some(Page::Fail(message)) => Err(BrowserError::Render {
                status: 500,
                message,
            }
            .into()),
            None => Err(BrowserError::Render {
                status: 404,
                message: format!("no page for {url}"),
            }
            .into()),
        }
    }

    async fn close(self: Box<Self>) {
        self.counters.lock().unwrap().closed += 1;
    }
}
