//! Pieces shared by the OpenAI chat and image clients.

use color_eyre::Result;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::PipelineError;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Errors reported by the OpenAI API, either as an HTTP status with an error
/// body, or as an error payload inside a response stream.
#[derive(Debug, Error)]
pub enum OpenAIApiError {
    #[error("Invalid request (400): {message}")]
    InvalidRequest { message: String },

    #[error("Authentication error (401): {message}")]
    Authentication { message: String },

    #[error("Permission error (403): {message}")]
    Permission { message: String },

    #[error("Not found (404): {message}")]
    NotFound { message: String },

    #[error("Rate limit exceeded (429): {message}")]
    RateLimit { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Catch-all for unexpected statuses and error types
    #[error("Unexpected API error ({error_type}): {message}")]
    Unexpected { error_type: String, message: String },
}

impl OpenAIApiError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => body.trim().to_string(),
        };

        match status {
            400 => Self::InvalidRequest { message },
            401 => Self::Authentication { message },
            403 => Self::Permission { message },
            404 => Self::NotFound { message },
            429 => Self::RateLimit { message },
            500..=599 => Self::Server { status, message },
            other => Self::Unexpected {
                error_type: other.to_string(),
                message,
            },
        }
    }

    pub fn from_type(error_type: &str, message: impl Into<String>) -> Self {
        let message = message.into();

        match error_type {
            "invalid_request_error" => Self::InvalidRequest { message },
            "authentication_error" | "invalid_api_key" => Self::Authentication { message },
            "permission_error" => Self::Permission { message },
            "not_found_error" => Self::NotFound { message },
            "rate_limit_exceeded" | "insufficient_quota" => Self::RateLimit { message },
            "server_error" => Self::Server {
                status: 500,
                message,
            },
            other => Self::Unexpected {
                error_type: other.to_string(),
                message,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl From<ErrorBody> for OpenAIApiError {
    fn from(body: ErrorBody) -> Self {
        let error_type = body.error_type.unwrap_or_default();
        Self::from_type(&error_type, body.message)
    }
}

pub(crate) fn endpoint_url(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path)
}

/// Turns a non-success response into a typed transport error.
pub(crate) async fn ensure_success(
    endpoint: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    debug!("{endpoint} error body:\n{body}");
    Err(PipelineError::transport(
        endpoint,
        OpenAIApiError::from_status(status.as_u16(), &body),
    )
    .into())
}
