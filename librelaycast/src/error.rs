//! Error types for Relaycast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelaycastError>;

#[derive(Error, Debug)]
pub enum RelaycastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RelaycastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RelaycastError::Config(_) => 2,
            RelaycastError::InvalidInput(_) => 3,
            RelaycastError::Database(_)
            | RelaycastError::Browser(_)
            | RelaycastError::Translate(_)
            | RelaycastError::Delivery(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failures while rendering a profile page through the browser service
#[derive(Error, Debug, Clone)]
pub enum BrowserError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Render failed (status {status}): {message}")]
    Render { status: u16, message: String },

    #[error("Failed to start session: {0}")]
    Session(String),
}

// reqwest renders the request URL into its Display output, and both service
// tokens travel in the URL, so every conversion strips it first.
impl From<reqwest::Error> for BrowserError {
    fn from(err: reqwest::Error) -> Self {
        BrowserError::Network(err.without_url().to_string())
    }
}

/// Failures talking to the chat-completion API
#[derive(Error, Debug, Clone)]
pub enum TranslateError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            TranslateError::Timeout(err.to_string())
        } else if err.is_decode() {
            TranslateError::MalformedResponse(err.to_string())
        } else {
            TranslateError::Network(err.to_string())
        }
    }
}

/// Failures delivering a message to the destination channel
#[derive(Error, Debug, Clone)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Platform rejected message (code {code}): {description}")]
    Api { code: i64, description: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            DeliveryError::UnexpectedResponse(err.to_string())
        } else {
            DeliveryError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let error = RelaycastError::Config(ConfigError::MissingField("telegram.bot_token".into()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_invalid_input() {
        let error = RelaycastError::InvalidInput("bad status filter".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_runtime_errors() {
        let db = RelaycastError::Database(DbError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        )));
        let browser = RelaycastError::Browser(BrowserError::Session("chrome exited".into()));
        let translate = RelaycastError::Translate(TranslateError::Timeout("60s".into()));
        let delivery = RelaycastError::Delivery(DeliveryError::Network("reset".into()));

        assert_eq!(db.exit_code(), 1);
        assert_eq!(browser.exit_code(), 1);
        assert_eq!(translate.exit_code(), 1);
        assert_eq!(delivery.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_config() {
        let error = RelaycastError::Config(ConfigError::MissingField("translator.api_key".into()));
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required field: translator.api_key"
        );
    }

    #[test]
    fn test_error_message_formatting_invalid_value() {
        let error = ConfigError::InvalidValue {
            field: "scheduling.post_interval".to_string(),
            reason: "must be at least 1 second".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid value for scheduling.post_interval: must be at least 1 second"
        );
    }

    #[test]
    fn test_error_message_formatting_delivery() {
        let error = RelaycastError::Delivery(DeliveryError::Api {
            code: 403,
            description: "Forbidden: bot is not a member of the channel chat".to_string(),
        });
        let message = error.to_string();
        assert!(message.starts_with("Delivery error: Platform rejected message (code 403)"));
        assert!(message.contains("not a member"));
    }

    #[test]
    fn test_error_message_formatting_translate_api() {
        let error = TranslateError::Api {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(error.to_string(), "API error (status 429): rate limited");
    }

    #[test]
    fn test_error_conversion_from_nested_errors() {
        let converted: RelaycastError = BrowserError::Network("refused".into()).into();
        assert!(matches!(converted, RelaycastError::Browser(BrowserError::Network(_))));

        let converted: RelaycastError = TranslateError::MalformedResponse("no choices".into()).into();
        assert!(matches!(converted, RelaycastError::Translate(_)));

        let converted: RelaycastError = DbError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "test",
        ))
        .into();
        assert!(matches!(converted, RelaycastError::Database(_)));
    }

    #[test]
    fn test_boundary_errors_clone() {
        let original = DeliveryError::Network("Connection failed".to_string());
        let cloned = original.clone();
        assert_eq!(original.to_string(), cloned.to_string());
    }
}
