//! Error types and handling for the AQI forecast service

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::regression::ModelError;

/// Main error type for the AQI forecast service
#[derive(Error, Debug)]
pub enum AqiError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream air quality API errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Regression model errors
    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AqiError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// HTTP status reported when the error escapes a request handler
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            AqiError::Api { .. } => StatusCode::BAD_GATEWAY,
            AqiError::Config { .. } | AqiError::Model { .. } | AqiError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AqiError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            AqiError::Api { .. } => {
                "Unable to reach the air quality services.".to_string()
            }
            AqiError::Model { source } => format!("AQI model failed: {source}"),
            AqiError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl IntoResponse for AqiError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);
        let body = Json(json!({ "error": self.user_message() }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AqiError::config("missing model path");
        assert!(matches!(config_err, AqiError::Config { .. }));

        let api_err = AqiError::api("connection failed");
        assert!(matches!(api_err, AqiError::Api { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = AqiError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = AqiError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let model_err: AqiError = ModelError::EmptyOutput.into();
        assert!(model_err.user_message().contains("AQI model failed"));
    }

    #[test]
    fn test_model_errors_are_server_errors() {
        let err: AqiError = ModelError::WidthMismatch {
            expected: 15,
            actual: 6,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let aqi_err: AqiError = io_err.into();
        assert!(matches!(aqi_err, AqiError::Io { .. }));
    }
}
