//! Classify client errors into retry policy error kinds.
//!
//! Classification is structural wherever the error type allows it: our own
//! deadline variants, `io::Error` of kind `TimedOut`, and curl's operation
//! timeout. Matching on message text is the last resort for opaque errors
//! and is reduced-confidence by nature.

use crate::error::{as_client_error, ClientError, INDEX_DDL_GATEWAY_TIMEOUT_CODE};
use crate::retry::policy::ErrorKind;
use std::error::Error as StdError;
use std::io;

/// Lowercase message fragments that indicate a timeout in opaque errors.
const TIMEOUT_MARKERS: &[&str] = &["timed out", "timeout", "deadline exceeded"];

/// Classify any error (typically a `ClientError`) for retry decisions.
pub fn classify(err: &(dyn StdError + 'static)) -> ErrorKind {
    if let Some(ClientError::Api(api)) = err.downcast_ref::<ClientError>() {
        return match api.http_status_code {
            429 => ErrorKind::Throttled(api.retry_after),
            504 if api.code != INDEX_DDL_GATEWAY_TIMEOUT_CODE => ErrorKind::GatewayTimeout,
            _ => ErrorKind::Other,
        };
    }
    if is_timeout_error(err) {
        return ErrorKind::Timeout;
    }
    ErrorKind::Other
}

/// Whether the error is a transient condition worth repeating the exact same
/// request for.
pub fn is_retryable(err: &(dyn StdError + 'static)) -> bool {
    classify(err) != ErrorKind::Other
}

/// True if a timeout appears anywhere in the cause chain.
pub fn is_timeout_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if is_structural_timeout(e) {
            return true;
        }
        current = e.source();
    }

    // Our own variants are fully described by their tag; their text can
    // embed arbitrary response bodies.
    let mut current = Some(err);
    while let Some(e) = current {
        if as_client_error(e).is_none() && message_indicates_timeout(&e.to_string()) {
            return true;
        }
        current = e.source();
    }
    false
}

fn is_structural_timeout(e: &(dyn StdError + 'static)) -> bool {
    if let Some(ce) = as_client_error(e) {
        return ce.is_deadline();
    }
    if let Some(io) = e.downcast_ref::<io::Error>() {
        return io.kind() == io::ErrorKind::TimedOut;
    }
    if let Some(curl) = e.downcast_ref::<curl::Error>() {
        return curl.is_operation_timedout();
    }
    false
}

fn message_indicates_timeout(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    TIMEOUT_MARKERS.iter().any(|m| msg.contains(m))
}
