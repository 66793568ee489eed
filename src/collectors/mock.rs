//! In-memory [`ApiClient`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::ovh::ApiClient;

/// Canned responses keyed by request path.
#[derive(Default)]
pub struct MockApiClient {
    responses: Mutex<HashMap<String, Result<serde_json::Value, (u16, String)>>>,
    calls: Mutex<Vec<String>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, path: &str, body: serde_json::Value) -> Self {
        self.set_response(path, body);
        self
    }

    pub fn with_failure(self, path: &str, status: u16, message: &str) -> Self {
        self.set_failure(path, status, message);
        self
    }

    pub fn set_response(&self, path: &str, body: serde_json::Value) {
        self.responses
            .lock()
            .expect("lock poisoned")
            .insert(path.to_string(), Ok(body));
    }

    pub fn set_failure(&self, path: &str, status: u16, message: &str) {
        self.responses
            .lock()
            .expect("lock poisoned")
            .insert(path.to_string(), Err((status, message.to_string())));
    }

    /// Paths requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(path.to_string());

        match self.responses.lock().expect("lock poisoned").get(path) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err((status, message))) => Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Err(ApiError::Status {
                status: 404,
                message: format!("The requested object ({}) does not exist", path),
            }),
        }
    }
}
