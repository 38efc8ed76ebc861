//! Scripted transport for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;

enum Scripted {
    Json(Value),
    Status(u16, String),
}

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
    token: Mutex<Option<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON response.
    pub fn respond(&self, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Scripted::Json(body));
        self
    }

    /// Queue a non-success response with a raw body.
    pub fn fail(&self, status: u16, body: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Status(status, body.to_string()));
        self
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bearer token currently attached, exposed for assertions.
    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");

        match next {
            Scripted::Json(value) => Ok(value),
            Scripted::Status(status, body) => Err(ApiError::from_response(status, &body)),
        }
    }

    async fn set_bearer_token(&self, token: Option<SecretString>) {
        *self.token.lock().unwrap() = token.map(|t| t.expose_secret().to_string());
    }
}
