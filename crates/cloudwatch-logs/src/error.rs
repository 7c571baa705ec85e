// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types returned by the logs client.

use std::fmt;

use serde::Deserialize;

pub type Result<T> = std::result::Result<T, LogsError>;

pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const RESOURCE_ALREADY_EXISTS: &str = "ResourceAlreadyExistsException";
pub const INVALID_SEQUENCE_TOKEN: &str = "InvalidSequenceTokenException";
pub const DATA_ALREADY_ACCEPTED: &str = "DataAlreadyAcceptedException";

/// Everything that can go wrong while talking to the logs endpoint.
#[derive(Debug, thiserror::Error)]
pub enum LogsError {
    /// The service answered with a non-200 status and a well-formed error document.
    #[error("{0}")]
    Service(ServiceError),
    /// Network, TLS or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A response body could not be decoded as JSON of the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    /// A request payload could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("failed to sign request: {0}")]
    Signing(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LogsError {
    /// Returns the service error when this is one.
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            LogsError::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceError> for LogsError {
    fn from(err: ServiceError) -> Self {
        LogsError::Service(err)
    }
}

/// Error document returned by the service on any non-200 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// HTTP status code (400, 403, ...).
    pub status_code: u16,
    /// Status line text, e.g. `400 Bad Request`.
    pub status: String,
    /// Value of `__type`.
    pub code: String,
    pub message: String,
    /// Sent alongside `InvalidSequenceTokenException`.
    pub expected_sequence_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    code: String,
    // The service is not consistent about the casing of this field.
    #[serde(alias = "Message", default)]
    message: String,
    #[serde(rename = "expectedSequenceToken", default)]
    expected_sequence_token: Option<String>,
}

impl ServiceError {
    /// Builds an error from a non-200 response. Fails when the body is not an error document.
    pub fn from_response(
        status: reqwest::StatusCode,
        body: &[u8],
    ) -> std::result::Result<Self, serde_json::Error> {
        let parsed: ErrorBody = serde_json::from_slice(body)?;
        Ok(Self {
            status_code: status.as_u16(),
            status: status_text(status),
            code: parsed.code,
            message: parsed.message,
            expected_sequence_token: parsed.expected_sequence_token,
        })
    }

    /// The bare error name, with any `namespace#` prefix removed.
    pub fn kind(&self) -> &str {
        match self.code.rsplit_once('#') {
            Some((_, name)) => name,
            None => &self.code,
        }
    }

    pub fn is_resource_not_found(&self) -> bool {
        self.kind() == RESOURCE_NOT_FOUND
    }

    pub fn is_resource_already_exists(&self) -> bool {
        self.kind() == RESOURCE_ALREADY_EXISTS
    }

    pub fn is_invalid_sequence_token(&self) -> bool {
        self.kind() == INVALID_SEQUENCE_TOKEN
    }

    pub fn is_data_already_accepted(&self) -> bool {
        self.kind() == DATA_ALREADY_ACCEPTED
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[HTTP {}] {} : {}",
            self.status_code, self.code, self.message
        )
    }
}

impl std::error::Error for ServiceError {}

fn status_text(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
