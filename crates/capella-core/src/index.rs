//! Index build watching on top of the poller.

use crate::client::Client;
use crate::error::ClientError;
use crate::poll::Poller;
use crate::transport::EndpointCfg;
use std::collections::HashMap;
use url::{ParseError, Url};

/// Build status reported once an index is usable.
pub const INDEX_READY: &str = "Ready";

/// Location of the indexes to watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// API base URL, e.g. `https://cloudapi.cloud.couchbase.com`.
    pub host: String,
    pub org_id: String,
    pub project_id: String,
    pub cluster_id: String,
    pub bucket: String,
    pub scope: String,
    pub collection: String,
}

/// URL of the build status endpoint for one index. The index name is
/// percent-encoded as a single path segment.
pub fn index_build_status_url(opts: &WatchOptions, index: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(&opts.host)?;
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend([
            "v4",
            "organizations",
            opts.org_id.as_str(),
            "projects",
            opts.project_id.as_str(),
            "clusters",
            opts.cluster_id.as_str(),
            "queryService",
            "indexBuildStatus",
            index,
        ]);
    url.query_pairs_mut()
        .append_pair("bucket", &opts.bucket)
        .append_pair("scope", &opts.scope)
        .append_pair("collection", &opts.collection);
    Ok(url)
}

/// Wait for one index build behind `endpoint` to report `Ready`.
pub fn poll_index_build(
    client: &Client,
    token: &str,
    endpoint: &EndpointCfg,
    poller: &Poller,
) -> Result<(), ClientError> {
    let headers = HashMap::new();
    poller.wait_for(INDEX_READY, || client.execute(endpoint, None, token, &headers))
}

/// Wait until every index in `indexes` reports `expected_state`, one after
/// another. A 404 while an index is still being created is retried like any
/// other failed check. Status URLs are built up front, so a bad host fails
/// with `InvalidUrl` before the first wait.
pub fn watch_indexes<S: AsRef<str>>(
    client: &Client,
    token: &str,
    expected_state: &str,
    indexes: &[S],
    opts: &WatchOptions,
    poller: &Poller,
) -> Result<(), ClientError> {
    let urls = indexes
        .iter()
        .map(|index| index_build_status_url(opts, index.as_ref()).map(String::from))
        .collect::<Result<Vec<String>, ClientError>>()?;

    let headers = HashMap::new();
    poller.wait_for_all(expected_state, &urls, |url| {
        client.execute(&EndpointCfg::get(url), None, token, &headers)
    })
}
