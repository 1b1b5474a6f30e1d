//! Error taxonomy for the client layer.
//!
//! `ClientError` is produced at the transport boundary and carried unchanged
//! through the retry executor, the pagination aggregator and the poller, so
//! callers can match on the variant (or on the wrapped `ApiError`) instead of
//! on message text.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// API error code returned with HTTP 504 while an index DDL statement is
/// still running server-side. Retrying the request would duplicate the DDL.
pub const INDEX_DDL_GATEWAY_TIMEOUT_CODE: i64 = 7001;

/// Structured error decoded from a non-2xx response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub http_status_code: u32,
    #[serde(default)]
    pub message: String,
    /// `Retry-After` sent alongside the error (only ever set for HTTP 429).
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// The error rendered as JSON, for user-facing diagnostics.
    pub fn complete_error(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status_code == 404
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ApiError {}

/// Errors returned by the transport and the layers built on it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint URL could not be parsed.
    #[error("error constructing request: invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// libcurl rejected an option while the request was being built.
    #[error("error constructing request: {0}")]
    Construct(#[source] curl::Error),

    /// Request payload could not be serialized.
    #[error("error marshalling payload: {0}")]
    Payload(#[source] serde_json::Error),

    /// The request could not be executed (connect, send, receive).
    #[error("error executing request: {0}")]
    Execute(#[source] curl::Error),

    /// Error status whose body is not an API error.
    #[error("unexpected code: {status}, body: {body}")]
    UndecodableError { status: u32, body: String },

    /// Status that is neither a success nor an error (1xx, 3xx).
    #[error("unexpected code: {status}, expected: {expected}, body: {body}")]
    UnexpectedStatus {
        status: u32,
        expected: u32,
        body: String,
    },

    /// Success body that does not match the expected shape.
    #[error("error decoding response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Server pagination cursor does not move forward.
    #[error("invalid pagination cursor: page {page} reported next page {next}")]
    InvalidCursor { page: u32, next: u32 },

    /// Server reported a failure.
    #[error(transparent)]
    Api(ApiError),

    /// Retry window elapsed before the request succeeded.
    #[error("timed out executing request against api after {timeout:?}: {source}")]
    RetryTimeout {
        timeout: Duration,
        #[source]
        source: Box<ClientError>,
    },

    /// Poller deadline elapsed before the operation reached its target state.
    #[error("operation did not complete within {0:?}")]
    PollTimeout(Duration),

    /// Poller attempt cap reached before the target state.
    #[error("maximum number of attempts ({0}) exceeded")]
    MaxAttemptsExceeded(u32),
}

impl ClientError {
    /// The decoded API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(e) => Some(e),
            _ => None,
        }
    }

    /// True for the deadline-style variants produced by this crate.
    pub fn is_deadline(&self) -> bool {
        matches!(
            self,
            ClientError::RetryTimeout { .. } | ClientError::PollTimeout(_)
        )
    }
}

/// View one link of a cause chain as a `ClientError`.
///
/// `RetryTimeout` keeps its cause as `Box<ClientError>`, and that box is the
/// link `source()` hands out, so both shapes are checked.
pub(crate) fn as_client_error<'a>(e: &'a (dyn StdError + 'static)) -> Option<&'a ClientError> {
    e.downcast_ref::<ClientError>()
        .or_else(|| e.downcast_ref::<Box<ClientError>>().map(|b| &**b))
}

/// Walk the cause chain and return the first API error found.
pub fn find_api_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ApiError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(api) = e.downcast_ref::<ApiError>() {
            return Some(api);
        }
        if let Some(api) = as_client_error(e).and_then(ClientError::api_error) {
            return Some(api);
        }
        current = e.source();
    }
    None
}

/// User-facing rendering: the complete API error when one is in the chain,
/// the plain message otherwise.
pub fn parse_error(err: &(dyn StdError + 'static)) -> String {
    match find_api_error(err) {
        Some(api) => api.complete_error(),
        None => err.to_string(),
    }
}

/// Reports whether `err` is an HTTP 404 from the API, together with the
/// user-facing rendering from [`parse_error`].
pub fn check_resource_not_found(err: &(dyn StdError + 'static)) -> (bool, String) {
    let not_found = find_api_error(err).is_some_and(ApiError::is_not_found);
    (not_found, parse_error(err))
}
