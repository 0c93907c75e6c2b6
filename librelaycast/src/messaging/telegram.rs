//! Telegram Bot API client
//!
//! Only the two methods the relay needs: `sendMessage` for publishing and
//! replies, and `getUpdates` long polling for admin commands.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::error::{DeliveryError, RelaycastError, Result};
use crate::messaging::{truncate_chars, Messenger, MAX_MESSAGE_CHARS};

/// Extra slack on top of the long-poll timeout before the HTTP call gives up
const POLL_GRACE: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Every Bot API response is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: SecretString,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(DeliveryError::from)?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: SecretString::from(config.bot_token.clone()),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), method)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(DeliveryError::from)?;

        // Bot API errors come back as non-2xx with a JSON envelope, so the
        // body is decoded regardless of status
        let status = response.status();
        let text = response.text().await.map_err(DeliveryError::from)?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
            DeliveryError::UnexpectedResponse(format!("{method} (HTTP {status}): {e}"))
        })?;

        if !envelope.ok {
            return Err(DeliveryError::Api {
                code: envelope.error_code.unwrap_or(i64::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }
            .into());
        }

        envelope.result.ok_or_else(|| {
            RelaycastError::from(DeliveryError::UnexpectedResponse(format!(
                "{method}: ok response without result"
            )))
        })
    }

    /// Send a plain-text message, truncated to the platform limit
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        let text = truncate_chars(text, MAX_MESSAGE_CHARS);
        debug!(chat_id, chars = text.chars().count(), "sendMessage");
        self.call("sendMessage", &SendMessageRequest { chat_id, text }, SEND_TIMEOUT)
            .await
    }

    /// Long-poll for message updates with `update_id >= offset`
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &request, timeout + POLL_GRACE).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            channel_id: -100,
            admin_id: 42,
            api_url: server.uri(),
        })
        .unwrap()
    }

    fn sent_message(chat_id: i64, text: &str) -> serde_json::Value {
        serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 7,
                "chat": { "id": chat_id, "type": "channel" },
                "date": 1700000000,
                "text": text
            }
        })
    }

    #[tokio::test]
    async fn test_send_message_posts_to_bot_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": -100,
                "text": "Срочные новости"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(-100, "Срочные новости")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.send_text(-100, "Срочные новости").await.unwrap();
    }

    #[tokio::test]
    async fn test_api_rejection_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot is not a member of the channel chat"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).send_text(-100, "hi").await.unwrap_err();
        match err {
            RelaycastError::Delivery(DeliveryError::Api { code, description }) => {
                assert_eq!(code, 403);
                assert!(description.contains("not a member"));
            }
            other => panic!("Expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_unexpected_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).send_text(-100, "hi").await.unwrap_err();
        assert!(matches!(
            err,
            RelaycastError::Delivery(DeliveryError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_before_sending() {
        let server = MockServer::start().await;
        let long = "a".repeat(MAX_MESSAGE_CHARS + 500);
        let expected = "a".repeat(MAX_MESSAGE_CHARS);
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({ "text": expected })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(-100, "a")))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).send_text(-100, &long).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_updates_decodes_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_partial_json(serde_json::json!({ "offset": 5, "timeout": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 5,
                        "message": {
                            "message_id": 1,
                            "from": { "id": 42, "is_bot": false, "first_name": "Admin" },
                            "chat": { "id": 42, "type": "private" },
                            "date": 1700000000,
                            "text": "/start"
                        }
                    },
                    { "update_id": 6 }
                ]
            })))
            .mount(&server)
            .await;

        let updates = client_for(&server)
            .get_updates(5, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(updates.len(), 2);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.from.as_ref().unwrap().id, 42);
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert!(updates[1].message.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_network_error() {
        let client = TelegramClient::new(&TelegramConfig {
            bot_token: "123456:SECRET-TOKEN".to_string(),
            channel_id: 1,
            admin_id: 1,
            api_url: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();

        let err = client.send_text(1, "hi").await.unwrap_err();
        assert!(matches!(err, RelaycastError::Delivery(DeliveryError::Network(_))));
    }

    #[tokio::test]
    async fn test_network_errors_do_not_reveal_bot_token() {
        let client = TelegramClient::new(&TelegramConfig {
            bot_token: "123456:SECRET-TOKEN".to_string(),
            channel_id: 1,
            admin_id: 1,
            api_url: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();

        let send = client.send_text(1, "hi").await.unwrap_err();
        let poll = client.get_updates(0, Duration::ZERO).await.unwrap_err();

        for err in [send, poll] {
            let rendered = format!("{err} {err:?}");
            assert!(!rendered.contains("SECRET-TOKEN"), "token leaked: {rendered}");
        }
    }
}
