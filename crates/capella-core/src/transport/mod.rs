//! Single authenticated HTTP request over libcurl.
//!
//! One call issues one request, drains the whole body and classifies the
//! status: 2xx returns the raw bytes untouched, >= 400 is decoded as an
//! `ApiError`. No JSON decoding of success bodies happens here.

mod parse;

use crate::error::{ApiError, ClientError};
use curl::easy::{Easy, List};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use url::Url;

pub use parse::{parse_header_lines, retry_after};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("capella-client/", env!("CARGO_PKG_VERSION"));

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    /// Methods whose repetition cannot duplicate a server-side effect.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request details for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCfg {
    /// Fully expanded endpoint URL.
    pub url: String,
    pub method: Method,
    /// Status the endpoint documents for success. Any other 2xx is still
    /// accepted.
    pub success_status: u32,
    /// Opt in to retrying a non-idempotent method on transient failures.
    pub allow_retry: bool,
}

impl EndpointCfg {
    pub fn new(url: impl Into<String>, method: Method, success_status: u32) -> Self {
        Self {
            url: url.into(),
            method,
            success_status,
            allow_retry: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::Get, 200)
    }

    pub fn with_retry(mut self) -> Self {
        self.allow_retry = true;
        self
    }
}

/// Successful response: status, headers of the final response, raw body.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u32,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Case-insensitive header lookup (first match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Per-request curl settings shared by every call of a client.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Upper bound for one whole request, including the body transfer.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Issue one request and return the drained response.
///
/// `payload` is sent verbatim; `headers` are applied after the defaults, so a
/// caller can override `Content-Type`.
pub fn execute(
    opts: &TransportOptions,
    endpoint: &EndpointCfg,
    payload: Option<&[u8]>,
    token: &str,
    headers: &HashMap<String, String>,
) -> Result<Response, ClientError> {
    let url = Url::parse(&endpoint.url)?;

    let mut easy = Easy::new();
    configure(&mut easy, opts, endpoint, &url, payload, token, headers)
        .map_err(ClientError::Construct)?;

    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                header_lines.push(header_line(data));
                true
            })
            .map_err(ClientError::Construct)?;
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(ClientError::Construct)?;
        transfer.perform().map_err(ClientError::Execute)?;
    }

    let status = easy.response_code().map_err(ClientError::Execute)?;
    let response = Response {
        status,
        headers: parse_header_lines(&header_lines),
        body,
    };
    check_status(endpoint, response)
}

/// One raw header line as text. Invalid UTF-8 is replaced rather than
/// dropped so the header name still matches.
fn header_line(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim_end().to_string()
}

fn configure(
    easy: &mut Easy,
    opts: &TransportOptions,
    endpoint: &EndpointCfg,
    url: &Url,
    payload: Option<&[u8]>,
    token: &str,
    headers: &HashMap<String, String>,
) -> Result<(), curl::Error> {
    easy.url(url.as_str())?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.useragent(&opts.user_agent)?;

    match (endpoint.method, payload) {
        (Method::Head, _) => easy.nobody(true)?,
        (method, Some(body)) => {
            easy.post_fields_copy(body)?;
            if method != Method::Post {
                easy.custom_request(method.as_str())?;
            }
        }
        (Method::Get, None) => easy.get(true)?,
        (Method::Post, None) => {
            easy.post(true)?;
            easy.post_field_size(0)?;
        }
        (method, None) => easy.custom_request(method.as_str())?,
    }

    let mut list = List::new();
    list.append(&format!("Authorization: Bearer {}", token))?;
    // Suppress 100-continue round trips for request bodies.
    list.append("Expect:")?;
    let caller_sets_type = headers.keys().any(|k| k.eq_ignore_ascii_case("content-type"));
    if payload.is_some() && !caller_sets_type {
        list.append("Content-Type: application/json")?;
    }
    for (k, v) in headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    easy.http_headers(list)?;
    Ok(())
}

/// Map the final status to success or a typed error.
fn check_status(endpoint: &EndpointCfg, response: Response) -> Result<Response, ClientError> {
    let status = response.status;
    if (200..300).contains(&status) {
        if status != endpoint.success_status {
            tracing::debug!(
                method = %endpoint.method,
                url = %endpoint.url,
                status,
                expected = endpoint.success_status,
                "accepting 2xx status other than the documented one"
            );
        }
        return Ok(response);
    }

    let body = String::from_utf8_lossy(&response.body).into_owned();
    if status < 400 {
        return Err(ClientError::UnexpectedStatus {
            status,
            expected: endpoint.success_status,
            body,
        });
    }

    let decoded = serde_json::from_slice::<ApiError>(&response.body)
        .ok()
        .filter(|e| e.code != 0 || !e.message.is_empty());
    let mut api = match (decoded, status) {
        (Some(e), _) => e,
        // Throttling and gateway timeouts must stay recognizable even when
        // the proxy in front of the API sends no structured body.
        (None, 429) => ApiError {
            message: "api key reached the rate limit".to_string(),
            ..ApiError::default()
        },
        (None, 504) => ApiError {
            message: "gateway timeout".to_string(),
            ..ApiError::default()
        },
        (None, _) => return Err(ClientError::UndecodableError { status, body }),
    };
    if api.http_status_code == 0 {
        api.http_status_code = status;
    }
    if status == 429 {
        api.retry_after = retry_after(&response.headers);
        tracing::debug!(
            method = %endpoint.method,
            url = %endpoint.url,
            retry_after = ?api.retry_after,
            "API rate limited"
        );
    }
    Err(ClientError::Api(api))
}
