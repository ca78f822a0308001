//! Transport adapter for the remote ledger API.
//!
//! A `Transport` performs exactly one HTTP exchange per call and reports only
//! network-level failures. Status interpretation lives in
//! [`interpret_response`] so every transport (HTTP or scripted) normalizes
//! failures the same way. There are no retries at this layer.

use crate::error::TransportError;
use nightwatch_protocol::{Endpoint, ErrorBody, Method};
use serde_json::Value;
use std::future::Future;

const NO_CONTENT: u16 = 204;

/// One outbound call: method + path, and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            body: None,
        }
    }

    pub fn with_body(endpoint: Endpoint, body: Value) -> Self {
        Self {
            endpoint,
            body: Some(body),
        }
    }
}

/// Status line and undecoded body of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: canonical_reason(status).to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    /// Sends one request. Fails only when no HTTP response was obtained.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>>;
}

/// Normalizes a raw response into `Some(json)`, `None` (no content), or an error.
///
/// Non-success: the error message is the body's `detail` when one can be
/// extracted, otherwise `"<code> <reason>"`. An undecodable error body is not a
/// secondary failure.
pub fn interpret_response(response: RawResponse) -> Result<Option<Value>, TransportError> {
    if !response.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message())
            .unwrap_or_else(|| status_line(response.status, &response.reason));
        return Err(TransportError::Status {
            status: response.status,
            message,
        });
    }

    if response.status == NO_CONTENT || response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_slice(&response.body).map_err(|err| TransportError::Decode {
            context: format!("HTTP {}", response.status),
            details: err.to_string(),
        })?;

    Ok((!value.is_null()).then_some(value))
}

fn status_line(status: u16, reason: &str) -> String {
    let reason = if reason.trim().is_empty() {
        canonical_reason(status)
    } else {
        reason.trim()
    };
    format!("{} {}", status, reason).trim_end().to_string()
}

fn canonical_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP Transport
// ═══════════════════════════════════════════════════════════════════════════════

/// `reqwest`-backed transport. Timeouts are the client's defaults.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| TransportError::Network(format!("Failed to build HTTP client: {}", err)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let method = match request.endpoint.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url(&request.endpoint));
        if let Some(body) = &request.body {
            let payload = serde_json::to_vec(body).map_err(|err| {
                TransportError::Network(format!("Failed to serialize request: {}", err))
            })?;
            builder = builder.body(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Network(format!("Network error: {}", err)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Network(format!("Failed to read response: {}", err)))?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }
}
