//! Cursor-following aggregation of paginated list endpoints.
//!
//! Pages are requested from 1 upward, each page's `data` is appended in
//! order, and the loop follows the server's `cursor.pages.next` until it is
//! zero or absent. The first page's raw body is kept so callers can read
//! envelope-level fields (e.g. `clusterStats`) that are not modeled here.

use crate::client::Client;
use crate::error::ClientError;
use crate::transport::EndpointCfg;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use url::Url;

/// Default number of items requested per page.
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Sort list results by id.
pub const SORT_BY_ID: &str = "id";
/// Sort list results by name.
pub const SORT_BY_NAME: &str = "name";

/// Pagination metadata for navigating through large data sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Cursor {
    pub pages: Pages,
    pub hrefs: Hrefs,
}

/// Page numbers and totals of the current result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pages {
    /// Current page, starting from 1.
    pub page: u32,
    /// Next page; 0 (or absent) on the last page.
    pub next: u32,
    pub previous: u32,
    pub last: u32,
    pub per_page: u32,
    pub total_items: u64,
}

/// Links to neighbouring pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Hrefs {
    pub first: String,
    pub last: String,
    pub previous: String,
    pub next: String,
}

/// One decoded page of a list response. `data` must be present; `null` is
/// read as an empty page.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(deserialize_with = "null_as_empty")]
    pub data: Vec<T>,
    #[serde(default)]
    pub cursor: Cursor,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// All items of a list plus the raw body of its first page.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub raw_first_page: Vec<u8>,
}

/// Page size and sort key for a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub per_page: u32,
    /// Empty means no `sortBy` parameter.
    pub sort_by: String,
}

impl PageQuery {
    pub fn new(per_page: u32, sort_by: &str) -> Self {
        Self {
            per_page,
            sort_by: sort_by.to_string(),
        }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE, SORT_BY_ID)
    }
}

/// Fetch every page of a list endpoint and return the items.
pub fn get_paginated<T: DeserializeOwned>(
    client: &Client,
    token: &str,
    endpoint: &EndpointCfg,
    sort_by: &str,
) -> Result<Vec<T>, ClientError> {
    Ok(get_paginated_with_meta(client, token, endpoint, sort_by)?.data)
}

/// Like [`get_paginated`], also returning the raw first page.
pub fn get_paginated_with_meta<T: DeserializeOwned>(
    client: &Client,
    token: &str,
    endpoint: &EndpointCfg,
    sort_by: &str,
) -> Result<Paginated<T>, ClientError> {
    paginate(
        client,
        token,
        endpoint,
        &PageQuery::new(DEFAULT_PER_PAGE, sort_by),
    )
}

/// Fetch every page with an explicit page size.
pub fn paginate<T: DeserializeOwned>(
    client: &Client,
    token: &str,
    endpoint: &EndpointCfg,
    query: &PageQuery,
) -> Result<Paginated<T>, ClientError> {
    let base = Url::parse(&endpoint.url)?;
    let no_headers = HashMap::new();

    let mut data = Vec::new();
    let mut raw_first_page = Vec::new();
    let mut page = 1u32;
    loop {
        let page_cfg = EndpointCfg {
            url: page_url(&base, page, query).into(),
            ..endpoint.clone()
        };
        let response = client.execute_with_retry(&page_cfg, None, token, &no_headers)?;
        let decoded: Page<T> =
            serde_json::from_slice(&response.body).map_err(ClientError::Decode)?;

        tracing::debug!(
            url = %endpoint.url,
            page,
            items = decoded.data.len(),
            next = decoded.cursor.pages.next,
            "fetched page"
        );

        if page == 1 {
            raw_first_page = response.body;
        }
        data.extend(decoded.data);

        let next = decoded.cursor.pages.next;
        if next == 0 {
            break;
        }
        if next <= page {
            return Err(ClientError::InvalidCursor { page, next });
        }
        page = next;
    }

    Ok(Paginated {
        data,
        raw_first_page,
    })
}

/// Endpoint URL with `page`, `perPage` and (when set) `sortBy` appended to
/// whatever query it already carries.
fn page_url(base: &Url, page: u32, query: &PageQuery) -> Url {
    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("page", &page.to_string())
            .append_pair("perPage", &query.per_page.to_string());
        if !query.sort_by.is_empty() {
            pairs.append_pair("sortBy", &query.sort_by);
        }
    }
    url
}
