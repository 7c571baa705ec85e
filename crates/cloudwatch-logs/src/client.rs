// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The logs client: one method per remote operation.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::config::LogsConfig;
use crate::error::{LogsError, Result, ServiceError};
use crate::http::{HttpRequest, ReqwestTransport, Transport};
use crate::model::{
    continuation, CreateLogGroupRequest, CreateLogStreamRequest, DescribeLogGroupsRequest,
    DescribeLogGroupsResponse, DescribeLogStreamsRequest, DescribeLogStreamsResponse,
    GetLogEventsRequest, GetLogEventsResponse, LogGroup, LogStream, PagedRequest, PagedResponse,
    PutLogEventsRequest, PutLogEventsResponse,
};
use crate::signer::{SigV4Signer, Signer};

/// Service name and API version every `X-Amz-Target` starts with.
pub const TARGET_PREFIX: &str = "Logs_20140328";
const X_AMZ_TARGET: &str = "x-amz-target";
const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Client for the logs JSON API.
///
/// Holds only fixed configuration, so it can be shared between tasks. Calls
/// to `put_log_events` on the same stream must still be serialized by the
/// caller, since each needs the sequence token returned by the previous one.
pub struct LogsClient<T = ReqwestTransport> {
    url: reqwest::Url,
    transport: T,
    signer: Arc<dyn Signer>,
}

impl LogsClient<ReqwestTransport> {
    /// Builds a client that talks to `config.endpoint` over reqwest.
    pub fn new(config: &LogsConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> LogsClient<T> {
    pub fn with_transport(config: &LogsConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let url = reqwest::Url::parse(&format!("{}/", config.endpoint.trim_end_matches('/')))
            .map_err(|e| LogsError::InvalidEndpoint(format!("{}: {e}", config.endpoint)))?;
        let signer = Arc::new(SigV4Signer::new(
            config.credentials.clone(),
            config.region.clone(),
        ));
        Ok(Self {
            url,
            transport,
            signer,
        })
    }

    /// Replaces the default SigV4 signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    /// URL every request is posted to.
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// Lists every log group matching the request, following continuation tokens.
    pub async fn describe_log_groups(
        &self,
        request: &DescribeLogGroupsRequest,
    ) -> Result<Vec<LogGroup>> {
        self.collect_pages::<_, DescribeLogGroupsResponse>("DescribeLogGroups", request)
            .await
    }

    /// Lists every log stream of a group matching the request, following continuation tokens.
    pub async fn describe_log_streams(
        &self,
        request: &DescribeLogStreamsRequest,
    ) -> Result<Vec<LogStream>> {
        self.collect_pages::<_, DescribeLogStreamsResponse>("DescribeLogStreams", request)
            .await
    }

    /// Fetches a single page of events. Paging is left to the caller via
    /// `next_forward_token` / `next_backward_token`.
    pub async fn get_log_events(
        &self,
        request: &GetLogEventsRequest,
    ) -> Result<GetLogEventsResponse> {
        let mut response: GetLogEventsResponse = self.call("GetLogEvents", request).await?;
        response.next_forward_token = continuation(response.next_forward_token);
        response.next_backward_token = continuation(response.next_backward_token);
        Ok(response)
    }

    pub async fn create_log_group(&self, request: &CreateLogGroupRequest) -> Result<()> {
        self.query("CreateLogGroup", request).await?;
        Ok(())
    }

    pub async fn create_log_stream(&self, request: &CreateLogStreamRequest) -> Result<()> {
        self.query("CreateLogStream", request).await?;
        Ok(())
    }

    /// Appends a batch of events and returns the sequence token for the next
    /// append to the same stream.
    ///
    /// Events are sorted by timestamp before sending; events sharing a
    /// timestamp keep their relative order.
    pub async fn put_log_events(&self, mut request: PutLogEventsRequest) -> Result<Option<String>> {
        request.log_events.sort_by_key(|event| event.timestamp);

        let response: PutLogEventsResponse = self.call("PutLogEvents", &request).await?;
        if let Some(rejected) = &response.rejected_log_events_info {
            warn!(
                log_group = %request.log_group_name,
                log_stream = %request.log_stream_name,
                too_new_start = ?rejected.too_new_log_event_start_index,
                too_old_end = ?rejected.too_old_log_event_end_index,
                expired_end = ?rejected.expired_log_event_end_index,
                "service rejected some log events"
            );
        }
        Ok(continuation(response.next_sequence_token))
    }

    /// Issues the request repeatedly, threading the continuation token, until
    /// the service stops returning one. Any failure discards the pages
    /// gathered so far.
    async fn collect_pages<Req, Resp>(
        &self,
        operation: &str,
        request: &Req,
    ) -> Result<Vec<Resp::Item>>
    where
        Req: PagedRequest + Send + Sync,
        Resp: PagedResponse,
    {
        let mut request = request.clone();
        let mut items = Vec::new();
        let mut pages = 0usize;
        loop {
            let page: Resp = self.call(operation, &request).await?;
            pages += 1;
            let (mut batch, next_token) = page.into_page();
            items.append(&mut batch);
            match next_token {
                Some(token) => request.set_next_token(Some(token)),
                None => break,
            }
        }
        debug!(operation, pages, items = items.len(), "listing complete");
        Ok(items)
    }

    /// Runs the operation and decodes its JSON response.
    async fn call<P, R>(&self, operation: &str, payload: &P) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let body = self.query(operation, payload).await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!(operation, "failed to decode response body: {e}");
            LogsError::Decode(e)
        })
    }

    /// Signs and posts one request. Returns the raw body on HTTP 200.
    async fn query<P>(&self, operation: &str, payload: &P) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized + Sync,
    {
        let body = serde_json::to_vec(payload).map_err(LogsError::Encode)?;
        let target = format!("{TARGET_PREFIX}.{operation}");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(
            X_AMZ_TARGET,
            HeaderValue::from_str(&target).map_err(|e| LogsError::InvalidHeader(e.to_string()))?,
        );
        let mut request = HttpRequest {
            url: self.url.clone(),
            headers,
            body,
        };
        self.signer.sign(&mut request, OffsetDateTime::now_utc())?;

        let response = self.transport.send(request).await.map_err(|e| {
            error!(operation, "error calling logs endpoint: {e}");
            e
        })?;

        if response.status != StatusCode::OK {
            return Err(match ServiceError::from_response(response.status, &response.body) {
                Ok(err) => {
                    error!(
                        operation,
                        status = err.status_code,
                        code = %err.code,
                        "logs request failed: {}",
                        err.message
                    );
                    LogsError::Service(err)
                }
                Err(e) => {
                    error!(
                        operation,
                        status = response.status.as_u16(),
                        "failed to parse error response as JSON: {e}"
                    );
                    LogsError::Decode(e)
                }
            });
        }
        Ok(response.body)
    }
}
