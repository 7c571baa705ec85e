// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Canned-response transport shared by the unit tests.

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::client::LogsClient;
use crate::config::{Credentials, LogsConfig};
use crate::error::{LogsError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};

pub(crate) const TEST_ENDPOINT: &str = "https://logs.us-east-1.amazonaws.com";

/// Replays queued responses in order and records every request it receives.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_json(&self, status: StatusCode, body: Value) {
        self.push(Ok(HttpResponse::new(status, body.to_string())));
    }

    pub(crate) fn push_raw(&self, status: StatusCode, body: &str) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    pub(crate) fn push(&self, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .expect("lock poisoned")
            .push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }

    /// Decoded JSON bodies of the requests sent so far.
    pub(crate) fn sent_json(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
            .collect()
    }

    /// `X-Amz-Target` of the requests sent so far.
    pub(crate) fn targets(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                r.headers
                    .get("x-amz-target")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().expect("lock poisoned").push(request);
        self.responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(LogsError::InvalidConfig(
                    "mock transport has no queued response".to_string(),
                ))
            })
    }
}

pub(crate) fn test_config() -> LogsConfig {
    LogsConfig::new(
        "us-east-1",
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
    )
    .with_endpoint(TEST_ENDPOINT)
}

pub(crate) fn mock_client() -> (LogsClient<Arc<MockTransport>>, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let client = LogsClient::with_transport(&test_config(), Arc::clone(&transport))
        .expect("test config is valid");
    (client, transport)
}
