// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! AWS Signature Version 4 request signing.
//!
//! Based on: <https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html>

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, HOST};
use sha2::{Digest, Sha256};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::config::Credentials;
use crate::error::{LogsError, Result};
use crate::http::HttpRequest;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "logs";

const X_AMZ_DATE: &str = "x-amz-date";
const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

/// Adds authentication headers to an outgoing request.
pub trait Signer: Send + Sync {
    fn sign(&self, request: &mut HttpRequest, now: OffsetDateTime) -> Result<()>;
}

/// SigV4 signer bound to one set of credentials and one region.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: SERVICE.to_string(),
        }
    }
}

impl Signer for SigV4Signer {
    fn sign(&self, request: &mut HttpRequest, now: OffsetDateTime) -> Result<()> {
        let timestamp = now
            .to_offset(time::UtcOffset::UTC)
            .format(format_description!(
                "[year][month][day]T[hour][minute][second]Z"
            ))
            .map_err(|e| LogsError::Signing(e.to_string()))?;
        let date = &timestamp[..8];

        let host = host_header(&request.url)?;
        request.headers.insert(HOST, header_value(&host)?);
        request.headers.insert(X_AMZ_DATE, header_value(&timestamp)?);
        if let Some(token) = &self.credentials.session_token {
            request
                .headers
                .insert(X_AMZ_SECURITY_TOKEN, header_value(token)?);
        }
        // A previous signature must not feed into the new one.
        request.headers.remove(AUTHORIZATION);

        let (canonical_request, signed_headers) = canonical_request(request);
        let credential_scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{credential_scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = signing_key(
            &self.credentials.secret_access_key,
            date,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        tracing::trace!(%canonical_request, %string_to_sign, "signed logs request");

        let authorization = format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id
        );
        request
            .headers
            .insert(AUTHORIZATION, header_value(&authorization)?);
        Ok(())
    }
}

/// Returns the canonical request and the `;`-joined list of signed header names.
///
/// Every header present on the request is signed. `HeaderMap` names are
/// already lowercase.
fn canonical_request(request: &HttpRequest) -> (String, String) {
    let mut names: Vec<&str> = request.headers.keys().map(HeaderName::as_str).collect();
    names.sort_unstable();
    names.dedup();

    let mut canonical_headers = String::new();
    for name in &names {
        let values: Vec<&str> = request
            .headers
            .get_all(*name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::trim)
            .collect();
        canonical_headers.push_str(name);
        canonical_headers.push(':');
        canonical_headers.push_str(&values.join(","));
        canonical_headers.push('\n');
    }
    let signed_headers = names.join(";");

    let path = match request.url.path() {
        "" => "/",
        path => path,
    };
    let query = request.url.query().unwrap_or("");
    let payload_hash = hex::encode(Sha256::digest(&request.body));

    (
        format!("POST\n{path}\n{query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"),
        signed_headers,
    )
}

/// Host header value as the transport will send it: the port only when it is not the default.
fn host_header(url: &reqwest::Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| LogsError::InvalidEndpoint(format!("{url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| LogsError::InvalidHeader(e.to_string()))
}

/// kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
fn signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_secret = format!("AWS4{secret_key}");
    let k_date = hmac_sha256(k_secret.as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| LogsError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, CONTENT_TYPE};
    use time::macros::datetime;

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const BODY: &str = r#"{"logGroupName":"app"}"#;

    fn create_log_group_request(endpoint: &str) -> HttpRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-amz-json-1.1"),
        );
        headers.insert(
            "x-amz-target",
            HeaderValue::from_static("Logs_20140328.CreateLogGroup"),
        );
        HttpRequest {
            url: reqwest::Url::parse(endpoint).unwrap(),
            headers,
            body: BODY.as_bytes().to_vec(),
        }
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> &'a str {
        request.headers.get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        let signer = SigV4Signer::new(Credentials::new("AKIDEXAMPLE", SECRET), "us-east-1");
        let mut request = create_log_group_request("https://logs.us-east-1.amazonaws.com/");

        signer
            .sign(&mut request, datetime!(2015-08-30 12:36:00 UTC))
            .unwrap();

        assert_eq!(header(&request, "x-amz-date"), "20150830T123600Z");
        assert_eq!(header(&request, "host"), "logs.us-east-1.amazonaws.com");
        assert_eq!(
            header(&request, "authorization"),
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/logs/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-amz-target, \
             Signature=719538aa321c3102499c06ccc82033f3d6838bf96ec0d25f31fed5b14e43dc0a"
        );
        assert!(request.headers.get("x-amz-security-token").is_none());
    }

    #[test]
    fn test_sign_with_session_token() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET).with_session_token("session-token");
        let signer = SigV4Signer::new(credentials, "us-east-1");
        let mut request = create_log_group_request("https://logs.us-east-1.amazonaws.com/");

        signer
            .sign(&mut request, datetime!(2015-08-30 12:36:00 UTC))
            .unwrap();

        assert_eq!(header(&request, "x-amz-security-token"), "session-token");
        assert_eq!(
            header(&request, "authorization"),
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/logs/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-amz-security-token;x-amz-target, \
             Signature=95eba73c2f7ae9a38b5fc28e6211ab94cae220615db716bbd98e96d58e5b90ff"
        );
    }

    #[test]
    fn test_canonical_request_layout() {
        let mut request = create_log_group_request("https://logs.us-east-1.amazonaws.com/");
        request.headers.insert(
            HOST,
            HeaderValue::from_static("logs.us-east-1.amazonaws.com"),
        );
        request
            .headers
            .insert(X_AMZ_DATE, HeaderValue::from_static("20150830T123600Z"));

        let (canonical, signed) = canonical_request(&request);
        assert_eq!(signed, "content-type;host;x-amz-date;x-amz-target");
        assert_eq!(
            canonical,
            "POST\n/\n\n\
             content-type:application/x-amz-json-1.1\n\
             host:logs.us-east-1.amazonaws.com\n\
             x-amz-date:20150830T123600Z\n\
             x-amz-target:Logs_20140328.CreateLogGroup\n\
             \n\
             content-type;host;x-amz-date;x-amz-target\n\
             5f091673ca826c88f506234700ffaa1ec162af5f80342135977b25c8a69a443b"
        );
    }

    #[test]
    fn test_host_header_keeps_non_default_port() {
        let url = reqwest::Url::parse("http://127.0.0.1:4566/").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:4566");
        let url = reqwest::Url::parse("https://logs.eu-west-1.amazonaws.com:443/").unwrap();
        assert_eq!(host_header(&url).unwrap(), "logs.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_resigning_replaces_previous_signature() {
        let signer = SigV4Signer::new(Credentials::new("AKIDEXAMPLE", SECRET), "us-east-1");
        let mut request = create_log_group_request("https://logs.us-east-1.amazonaws.com/");

        signer
            .sign(&mut request, datetime!(2015-08-30 12:36:00 UTC))
            .unwrap();
        signer
            .sign(&mut request, datetime!(2015-08-30 12:36:00 UTC))
            .unwrap();

        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert!(header(&request, "authorization").ends_with(
            "Signature=719538aa321c3102499c06ccc82033f3d6838bf96ec0d25f31fed5b14e43dc0a"
        ));
    }
}
