//! Authenticated API client: one-shot and retried request execution.

use crate::config::CapellaConfig;
use crate::error::ClientError;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::{self, EndpointCfg, Response, TransportOptions};
use serde::Serialize;
use std::collections::HashMap;

/// Executes requests against the API. Holds no per-call state, so one client
/// can be shared by concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Client {
    transport: TransportOptions,
    retry: RetryPolicy,
}

impl Client {
    pub fn new(transport: TransportOptions, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Client with the transport timeouts and retry policy from config.
    pub fn from_config(cfg: &CapellaConfig) -> Self {
        Self::new(cfg.transport_options(), cfg.retry_policy())
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Issue one request, without retries.
    pub fn execute(
        &self,
        endpoint: &EndpointCfg,
        payload: Option<&[u8]>,
        token: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Response, ClientError> {
        transport::execute(&self.transport, endpoint, payload, token, headers)
    }

    /// Issue a request, retrying transient failures per the client's policy.
    ///
    /// Every attempt sends the same payload bytes. Methods that are not
    /// idempotent are only repeated after an explicit throttling rejection,
    /// unless the endpoint opts in with `allow_retry`.
    pub fn execute_with_retry(
        &self,
        endpoint: &EndpointCfg,
        payload: Option<&[u8]>,
        token: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Response, ClientError> {
        let policy = if endpoint.method.is_idempotent() || endpoint.allow_retry {
            self.retry
        } else {
            self.retry.throttled_only()
        };
        run_with_retry(&policy, || self.execute(endpoint, payload, token, headers))
    }
}

/// Serialize a request payload to JSON bytes.
pub fn encode_payload<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(payload).map_err(ClientError::Payload)
}
