// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client configuration, either built by hand or derived from the process environment.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{LogsError, Result};

const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const ENV_REGION: &str = "AWS_REGION";
const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
/// Overrides the regional endpoint, e.g. for a local emulator.
const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL_LOGS";
const ENV_TIMEOUT_SECS: &str = "LOGS_HTTP_TIMEOUT_SECS";
const ENV_HTTPS_PROXY: &str = "HTTPS_PROXY";
const ENV_ALLOW_PLAINTEXT: &str = "LOGS_ALLOW_PLAINTEXT";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Static credentials used to sign every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Present for temporary (STS) credentials.
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    #[must_use]
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Everything the client needs: where to send requests and how to sign them.
#[derive(Debug, Clone)]
pub struct LogsConfig {
    /// Scheme and host, without a trailing path, e.g. `https://logs.us-east-1.amazonaws.com`.
    pub endpoint: String,
    pub region: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub https_proxy: Option<String>,
    /// Permit `http://` endpoints.
    pub allow_plaintext: bool,
}

impl LogsConfig {
    /// Config targeting the public regional endpoint.
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Self {
        let region = region.into();
        Self {
            endpoint: default_endpoint(&region),
            region,
            credentials,
            timeout: DEFAULT_TIMEOUT,
            https_proxy: None,
            allow_plaintext: false,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads the configuration from the current process environment.
    pub fn from_os_env() -> Result<Self> {
        Self::from_env_iter(env::vars())
    }

    /// Reads the configuration from key/value pairs (typically for tests).
    pub fn from_env_iter<I, K, V>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| sanitize_non_empty(map.get(key).map(String::as_str));

        let region = get(ENV_REGION)
            .or_else(|| get(ENV_DEFAULT_REGION))
            .ok_or_else(|| {
                LogsError::InvalidConfig(format!("{ENV_REGION} or {ENV_DEFAULT_REGION} must be set"))
            })?;
        let access_key_id = get(ENV_ACCESS_KEY_ID)
            .ok_or_else(|| LogsError::InvalidConfig(format!("{ENV_ACCESS_KEY_ID} must be set")))?;
        let secret_access_key = get(ENV_SECRET_ACCESS_KEY).ok_or_else(|| {
            LogsError::InvalidConfig(format!("{ENV_SECRET_ACCESS_KEY} must be set"))
        })?;

        let credentials = Credentials {
            access_key_id,
            secret_access_key,
            session_token: get(ENV_SESSION_TOKEN),
        };
        let mut config = Self::new(region, credentials);
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            let secs = secs.parse::<u64>().map_err(|_| {
                LogsError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{secs}'"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.https_proxy = get(ENV_HTTPS_PROXY);
        config.allow_plaintext = parse_bool(get(ENV_ALLOW_PLAINTEXT).as_deref(), false);

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the client relies on.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(LogsError::InvalidConfig("region cannot be empty".to_string()));
        }
        if self.credentials.access_key_id.is_empty() || self.credentials.secret_access_key.is_empty()
        {
            return Err(LogsError::InvalidConfig(
                "access key id and secret access key are required".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(LogsError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| LogsError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
        match url.scheme() {
            "https" => {}
            // Plaintext endpoints are only for local emulators and need an explicit opt-in.
            "http" if self.allow_plaintext => {}
            "http" => {
                return Err(LogsError::InvalidEndpoint(format!(
                    "{} uses plaintext http; set allow_plaintext to permit it",
                    self.endpoint
                )))
            }
            other => {
                return Err(LogsError::InvalidEndpoint(format!(
                    "unsupported scheme '{other}' in {}",
                    self.endpoint
                )))
            }
        }
        if url.host_str().is_none() {
            return Err(LogsError::InvalidEndpoint(format!(
                "{} has no host",
                self.endpoint
            )));
        }
        Ok(())
    }
}

/// Public regional endpoint for the logs service.
pub fn default_endpoint(region: &str) -> String {
    if region.starts_with("cn-") {
        format!("https://logs.{region}.amazonaws.com.cn")
    } else {
        format!("https://logs.{region}.amazonaws.com")
    }
}

fn sanitize_non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
            ("AWS_REGION", "us-east-1"),
        ]
    }

    #[test]
    fn test_from_env_defaults() {
        let config = LogsConfig::from_env_iter(base_env()).unwrap();
        assert_eq!(config.endpoint, "https://logs.us-east-1.amazonaws.com");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.credentials.access_key_id, "AKIDEXAMPLE");
        assert_eq!(config.credentials.session_token, None);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.https_proxy, None);
        assert!(!config.allow_plaintext);
    }

    #[test]
    fn test_from_env_falls_back_to_default_region() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "AWS_REGION");
        env.push(("AWS_DEFAULT_REGION", "eu-west-1"));
        let config = LogsConfig::from_env_iter(env).unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.endpoint, "https://logs.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_from_env_overrides() {
        let mut env = base_env();
        env.push(("AWS_SESSION_TOKEN", "session"));
        env.push(("AWS_ENDPOINT_URL_LOGS", "http://localhost:4566/"));
        env.push(("LOGS_ALLOW_PLAINTEXT", "true"));
        env.push(("LOGS_HTTP_TIMEOUT_SECS", "3"));
        env.push(("HTTPS_PROXY", "http://proxy:3128"));
        let config = LogsConfig::from_env_iter(env).unwrap();
        assert_eq!(config.endpoint, "http://localhost:4566");
        assert_eq!(config.credentials.session_token.as_deref(), Some("session"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
        assert!(config.allow_plaintext);
    }

    #[test]
    fn test_from_env_requires_credentials() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "AWS_SECRET_ACCESS_KEY");
        let err = LogsConfig::from_env_iter(env).unwrap_err();
        assert!(matches!(err, LogsError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_env_ignores_blank_values() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "AWS_REGION");
        env.push(("AWS_REGION", "   "));
        let err = LogsConfig::from_env_iter(env).unwrap_err();
        assert!(matches!(err, LogsError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_env_rejects_bad_timeout() {
        let mut env = base_env();
        env.push(("LOGS_HTTP_TIMEOUT_SECS", "soon"));
        assert!(LogsConfig::from_env_iter(env).is_err());
    }

    #[test]
    fn test_validate_rejects_plaintext_without_opt_in() {
        let config = LogsConfig::new("us-east-1", Credentials::new("ak", "sk"))
            .with_endpoint("http://localhost:4566");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LogsError::InvalidEndpoint(_)));

        let config = LogsConfig {
            allow_plaintext: true,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = LogsConfig::new("us-east-1", Credentials::new("ak", "sk"))
            .with_endpoint("logs.us-east-1.amazonaws.com");
        assert!(matches!(
            config.validate(),
            Err(LogsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_default_endpoint_china_partition() {
        assert_eq!(
            default_endpoint("cn-north-1"),
            "https://logs.cn-north-1.amazonaws.com.cn"
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("AKIDEXAMPLE", "super-secret").with_session_token("tok");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("tok\""));
    }
}
