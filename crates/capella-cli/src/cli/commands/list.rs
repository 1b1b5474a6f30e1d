//! `capella list` – fetch every page of a list endpoint.

use anyhow::{Context, Result};
use capella_core::pagination::{self, PageQuery};
use capella_core::{Client, EndpointCfg};
use serde_json::Value;

pub fn run_list(client: &Client, token: &str, url: &str, per_page: u32, sort_by: &str) -> Result<()> {
    let endpoint = EndpointCfg::get(url);
    let query = PageQuery::new(per_page, sort_by);
    let items = pagination::paginate::<Value>(client, token, &endpoint, &query)
        .with_context(|| format!("listing {}", url))?
        .data;

    tracing::info!(url, items = items.len(), "list complete");
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}
