// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Request and response payloads. Field names follow the `Logs_20140328` wire contract.

use serde::{Deserialize, Serialize};

/// Snapshot of a log group as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogGroup {
    pub arn: String,
    pub creation_time: i64,
    pub log_group_name: String,
    pub metric_filter_count: i32,
    /// Absent when events never expire.
    pub retention_in_days: Option<i32>,
    pub stored_bytes: i64,
}

/// Snapshot of a log stream inside a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogStream {
    pub arn: String,
    pub creation_time: i64,
    pub first_event_timestamp: Option<i64>,
    pub last_event_timestamp: Option<i64>,
    pub last_ingestion_time: Option<i64>,
    pub log_stream_name: String,
    pub stored_bytes: i64,
    /// Token to pass to the next `PutLogEvents` call on this stream.
    pub upload_sequence_token: Option<String>,
}

/// An event to append to a stream. `timestamp` is milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLogEvent {
    pub timestamp: i64,
    pub message: String,
}

impl InputLogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

/// An event read back from a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputLogEvent {
    pub timestamp: i64,
    pub ingestion_time: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogGroupsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_group_name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeLogGroupsResponse {
    pub log_groups: Vec<LogGroup>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    pub log_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_stream_name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeLogStreamsResponse {
    pub log_streams: Vec<LogStream>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogEventsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    pub log_group_name: String,
    pub log_stream_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Read from the oldest event first instead of the newest.
    pub start_from_head: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetLogEventsResponse {
    pub events: Vec<OutputLogEvent>,
    pub next_forward_token: Option<String>,
    pub next_backward_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogGroupRequest {
    pub log_group_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogStreamRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsRequest {
    pub log_events: Vec<InputLogEvent>,
    pub log_group_name: String,
    pub log_stream_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PutLogEventsResponse {
    pub next_sequence_token: Option<String>,
    pub rejected_log_events_info: Option<RejectedLogEventsInfo>,
}

/// Indices into the submitted batch of events the service refused to store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RejectedLogEventsInfo {
    pub too_new_log_event_start_index: Option<i64>,
    pub too_old_log_event_end_index: Option<i64>,
    pub expired_log_event_end_index: Option<i64>,
}

/// Normalizes a continuation token: the service sometimes sends `""` instead of omitting it.
pub(crate) fn continuation(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// A listing request that can be re-issued with a continuation token.
pub(crate) trait PagedRequest: Serialize + Clone {
    fn set_next_token(&mut self, token: Option<String>);
}

/// One page of a listing: the items plus the token for the next page, if any.
pub(crate) trait PagedResponse: serde::de::DeserializeOwned {
    type Item;

    fn into_page(self) -> (Vec<Self::Item>, Option<String>);
}

impl PagedRequest for DescribeLogGroupsRequest {
    fn set_next_token(&mut self, token: Option<String>) {
        self.next_token = token;
    }
}

impl PagedResponse for DescribeLogGroupsResponse {
    type Item = LogGroup;

    fn into_page(self) -> (Vec<LogGroup>, Option<String>) {
        (self.log_groups, continuation(self.next_token))
    }
}

impl PagedRequest for DescribeLogStreamsRequest {
    fn set_next_token(&mut self, token: Option<String>) {
        self.next_token = token;
    }
}

impl PagedResponse for DescribeLogStreamsResponse {
    type Item = LogStream;

    fn into_page(self) -> (Vec<LogStream>, Option<String>) {
        (self.log_streams, continuation(self.next_token))
    }
}
