// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport seam.
//!
//! The client builds and signs an [`HttpRequest`], hands it to a [`Transport`]
//! and interprets the returned [`HttpResponse`]. The production transport is
//! [`ReqwestTransport`]; tests substitute canned responses.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

use crate::config::LogsConfig;
use crate::error::{LogsError, Result};

/// A fully prepared POST request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: reqwest::Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one request and returns the raw response. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &LogsConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout);
        if let Some(https_proxy) = &config.https_proxy {
            let proxy = reqwest::Proxy::https(https_proxy)
                .map_err(|e| LogsError::InvalidConfig(format!("invalid https proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one shared with other components.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest { url, headers, body } = request;
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(
                url = %url,
                headers = ?redact_headers(&headers),
                body = %body_preview(&body),
                "logs HTTP request"
            );
        } else {
            tracing::debug!(
                url = %url,
                headers = ?redact_headers(&headers),
                body_len = body.len(),
                "logs HTTP request"
            );
        }

        let response = self
            .client
            .post(url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(
            url = %url,
            status = %status,
            content_length = body.len(),
            "logs HTTP response"
        );
        Ok(HttpResponse { status, body })
    }
}

/// Returns a redacted view of request headers suitable for debug logging.
pub(crate) fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    const SENSITIVE_HEADERS: [&str; 2] = ["authorization", "x-amz-security-token"];

    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.as_str().to_ascii_lowercase();
            let display = if SENSITIVE_HEADERS.contains(&lower.as_str()) {
                "<redacted>".to_string()
            } else {
                value
                    .to_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| "<non-utf8>".to_string())
            };
            (lower, display)
        })
        .collect()
}

fn body_preview(body: &[u8]) -> String {
    truncate_preview_text(String::from_utf8_lossy(body))
}

fn truncate_preview_text(text: Cow<'_, str>) -> String {
    const MAX_CHARS: usize = 1024;
    let mut chars = text.chars();
    let mut preview = String::new();
    for _ in 0..MAX_CHARS {
        match chars.next() {
            Some(ch) => preview.push(ch),
            None => return preview,
        }
    }
    if chars.next().is_some() {
        preview.push('…');
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn redact_headers_hides_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_static("AWS4-HMAC-SHA256 Credential=AKID/..."),
        );
        headers.insert("X-Amz-Security-Token", HeaderValue::from_static("session"));
        headers.insert(
            "X-Amz-Target",
            HeaderValue::from_static("Logs_20140328.PutLogEvents"),
        );

        let redacted = redact_headers(&headers);
        assert!(redacted.contains(&("authorization".to_string(), "<redacted>".to_string())));
        assert!(redacted.contains(&(
            "x-amz-security-token".to_string(),
            "<redacted>".to_string()
        )));
        assert!(redacted.contains(&(
            "x-amz-target".to_string(),
            "Logs_20140328.PutLogEvents".to_string()
        )));
    }

    #[test]
    fn body_preview_limits_length() {
        let payload = "a".repeat(1500);
        let preview = body_preview(payload.as_bytes());
        assert!(preview.ends_with('…'), "preview should be truncated");
        assert_eq!(preview.chars().count(), 1025);
    }

    #[test]
    fn body_preview_keeps_short_json() {
        assert_eq!(
            body_preview(br#"{"logGroupName":"app"}"#),
            r#"{"logGroupName":"app"}"#
        );
    }
}
