//! Request failure type shared by the transport, services, and stores.
//!
//! Stores turn an [`ApiError`] into the message they expose to the UI with
//! [`ApiError::display_message`]: the backend's own `message` when it sent
//! one, otherwise an action-specific fallback.

use serde::Deserialize;
use thiserror::Error;

/// A failed request to the shop backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a usable response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status}{}", format_server_message(.message.as_deref()))]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` field of the JSON error body, if any.
        message: Option<String>,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Error body shape used by every backend service.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn format_server_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(" - {m}"))
}

impl ApiError {
    /// Build an error from a non-success response.
    ///
    /// Picks up the `message` field when the body is a JSON object carrying
    /// one; any other body is ignored.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        Self::Api { status, message }
    }

    /// Message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Message to show the user: the server's when present, else `fallback`.
    #[must_use]
    pub fn display_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// HTTP status of the failed response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }

    /// Whether the backend rejected the credentials or token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
