// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client for the CloudWatch Logs JSON API (`Logs_20140328`).
//!
//! Covers log groups, log streams and log events: listing (with automatic
//! pagination), creation, reading and appending. Requests are signed with
//! SigV4 and posted through a [`Transport`], which tests can replace.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod signer;
mod test_support;

pub use client::{LogsClient, TARGET_PREFIX};
pub use config::{Credentials, LogsConfig};
pub use error::{LogsError, Result, ServiceError};
pub use http::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use model::{
    CreateLogGroupRequest, CreateLogStreamRequest, DescribeLogGroupsRequest,
    DescribeLogStreamsRequest, GetLogEventsRequest, GetLogEventsResponse, InputLogEvent, LogGroup,
    LogStream, OutputLogEvent, PutLogEventsRequest, RejectedLogEventsInfo,
};
pub use signer::{SigV4Signer, Signer};
