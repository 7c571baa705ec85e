// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cloudwatch_logs::{
    GetLogEventsRequest, GetLogEventsResponse, LogsClient, LogsConfig, OutputLogEvent,
};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const PAGE_LIMIT: i32 = 1000;

#[tokio::main]
pub async fn main() {
    let log_level = env::var("LOGS_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let (log_group_name, log_stream_name) = match (
        non_empty(env::var("LOGS_GROUP_NAME").ok()),
        non_empty(env::var("LOGS_STREAM_NAME").ok()),
    ) {
        (Some(group), Some(stream)) => (group, stream),
        _ => {
            error!("LOGS_GROUP_NAME and LOGS_STREAM_NAME must be set and non-empty");
            return;
        }
    };
    let poll_interval = env::var("LOGS_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|secs| secs.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

    let config = match LogsConfig::from_os_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error reading logs client configuration: {e}");
            return;
        }
    };
    let client = match LogsClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Error creating logs client: {e}");
            return;
        }
    };

    info!(
        endpoint = %config.endpoint,
        "following {log_group_name}/{log_stream_name} every {poll_interval}s"
    );

    let mut request = GetLogEventsRequest {
        limit: Some(PAGE_LIMIT),
        log_group_name,
        log_stream_name,
        start_from_head: true,
        ..Default::default()
    };

    let mut poll = interval(Duration::from_secs(poll_interval));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = poll.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                return;
            }
        }

        // Drain every page available right now before sleeping again.
        loop {
            let page = match client.get_log_events(&request).await {
                Ok(page) => page,
                Err(e) => {
                    error!("Failed to fetch log events: {e}");
                    break;
                }
            };
            for event in &page.events {
                print_event(event);
            }
            match next_page_token(request.next_token.as_deref(), &page) {
                Some(token) => request.next_token = Some(token),
                None => {
                    if page.next_forward_token.is_some() {
                        request.next_token = page.next_forward_token;
                    }
                    break;
                }
            }
        }
    }
}

fn print_event(event: &OutputLogEvent) {
    println!("{} {}", event.timestamp, event.message.trim_end());
}

/// Trims an environment value and treats blank as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Token for fetching the next page right away, or `None` when draining should
/// stop. The forward token repeats once the end of the stream is reached.
fn next_page_token(current: Option<&str>, page: &GetLogEventsResponse) -> Option<String> {
    if page.events.is_empty() {
        return None;
    }
    page.next_forward_token
        .as_deref()
        .filter(|token| Some(*token) != current)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(events: usize, forward: Option<&str>) -> GetLogEventsResponse {
        GetLogEventsResponse {
            events: (0..events)
                .map(|i| OutputLogEvent {
                    timestamp: i as i64,
                    ingestion_time: i as i64,
                    message: format!("line {i}"),
                })
                .collect(),
            next_forward_token: forward.map(str::to_string),
            next_backward_token: None,
        }
    }

    #[test]
    fn repeated_forward_token_stops_draining() {
        assert_eq!(next_page_token(Some("f/1"), &page(3, Some("f/1"))), None);
    }

    #[test]
    fn advancing_forward_token_continues() {
        assert_eq!(
            next_page_token(Some("f/1"), &page(3, Some("f/2"))),
            Some("f/2".to_string())
        );
        assert_eq!(
            next_page_token(None, &page(1, Some("f/1"))),
            Some("f/1".to_string())
        );
    }

    #[test]
    fn empty_page_or_missing_token_stops_draining() {
        assert_eq!(next_page_token(Some("f/1"), &page(0, Some("f/2"))), None);
        assert_eq!(next_page_token(Some("f/1"), &page(2, None)), None);
    }

    #[test]
    fn blank_names_are_treated_as_unset() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some(" app ".to_string())), Some("app".to_string()));
    }
}
