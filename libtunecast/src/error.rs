//! Error types for Tunecast

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TunecastError>;

#[derive(Error, Debug)]
pub enum TunecastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TunecastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TunecastError::InvalidInput(_) => 3,
            TunecastError::Validation(_) => 3,
            TunecastError::Api(ApiError::Unauthorized(_)) => 2,
            TunecastError::Api(_) => 1,
            TunecastError::Transport(_) => 1,
            TunecastError::Config(_) => 1,
            TunecastError::Storage(_) => 1,
            TunecastError::Io(_) => 1,
        }
    }

    /// Message suitable for an inline error banner.
    ///
    /// Server rejections carry their own message; everything else falls back
    /// to the display form.
    pub fn banner_message(&self) -> String {
        match self {
            TunecastError::Api(ApiError::Rejected { message }) => message.clone(),
            TunecastError::Api(ApiError::Status { message: Some(m), .. }) => m.clone(),
            other => other.to_string(),
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
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Server returned {status}{}", message_suffix(.message))]
    Status { status: u16, message: Option<String> },

    #[error("Request rejected: {message}")]
    Rejected { message: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No route for {method} {path}")]
    NoRoute { method: String, path: String },
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Connection closed")]
    Closed,

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Send failed: {0}")]
    Send(String),
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

/// A push payload that could not be mapped onto a client record.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Malformed payload for '{event}': {reason}")]
    Malformed { event: String, reason: String },
}

/// Per-field form errors, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert into a result, failing if any field has an error.
    pub fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields: self })
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{fields}")]
pub struct ValidationError {
    pub fields: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = TunecastError::InvalidInput("Empty content".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_validation() {
        let mut fields = FieldErrors::new();
        fields.add("email", "Email is required");
        let error: TunecastError = ValidationError { fields }.into();
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_unauthorized() {
        let error = TunecastError::Api(ApiError::Unauthorized("expired token".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_transport() {
        let error = TunecastError::Transport(TransportError::Closed);
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_config() {
        let error = TunecastError::Config(ConfigError::MissingField("api.base_url".to_string()));
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required field: api.base_url"
        );
    }

    #[test]
    fn test_status_message_formatting() {
        let with = ApiError::Status {
            status: 400,
            message: Some("Email not found".to_string()),
        };
        assert_eq!(with.to_string(), "Server returned 400: Email not found");

        let without = ApiError::Status {
            status: 502,
            message: None,
        };
        assert_eq!(without.to_string(), "Server returned 502");
    }

    #[test]
    fn test_banner_prefers_server_message() {
        let error = TunecastError::Api(ApiError::Rejected {
            message: "Wrong password".to_string(),
        });
        assert_eq!(error.banner_message(), "Wrong password");

        let error = TunecastError::InvalidInput("bad".to_string());
        assert_eq!(error.banner_message(), "Invalid input: bad");
    }

    #[test]
    fn test_field_errors_first_wins() {
        let mut fields = FieldErrors::new();
        fields.add("password", "Password is required");
        fields.add("password", "Password is too short");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("password"), Some("Password is required"));
    }

    #[test]
    fn test_field_errors_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut fields = FieldErrors::new();
        fields.add("email", "Invalid email");
        let err = fields.into_result().unwrap_err();
        assert_eq!(err.to_string(), "email: Invalid email");
    }
}
