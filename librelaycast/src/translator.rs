//! Translation through an OpenAI-compatible chat-completion API
//!
//! [`Translate::translate`] never fails: any error is logged and the source
//! text is returned so that publishing can continue untranslated.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TranslatorConfig;
use crate::error::{Result, TranslateError};

pub const SYSTEM_PROMPT: &str = "Ты профессиональный переводчик.";
const USER_DIRECTIVE: &str = "Переведи следующий текст на русский для Telegram-канала, \
сохрани смысл и цифры, без добавлений:";

#[async_trait]
pub trait Translate: Send + Sync {
    /// Translated text, or `text` unchanged when translation fails
    async fn translate(&self, text: &str) -> String;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Build the fixed two-message exchange for `text`
pub fn build_messages(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{USER_DIRECTIVE}\n\n{text}")),
    ]
}

pub struct OpenRouterTranslator {
    http: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenRouterTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TranslateError::from)?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(config.api_key.clone()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn headers(&self) -> std::result::Result<HeaderMap, TranslateError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|e| TranslateError::Network(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Single completion call; any deviation from the expected shape is an error
    pub async fn try_translate(&self, text: &str) -> std::result::Result<String, TranslateError> {
        let url = format!("{}/chat/completions", self.api_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: build_messages(text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %request.model, chars = text.chars().count(), "Translation request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| TranslateError::MalformedResponse("no completion content".to_string()))
    }
}

#[async_trait]
impl Translate for OpenRouterTranslator {
    async fn translate(&self, text: &str) -> String {
        match self.try_translate(text).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "Translation failed, publishing original text");
                text.to_string()
            }
        }
    }
}
