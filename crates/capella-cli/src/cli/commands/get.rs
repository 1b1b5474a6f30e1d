//! `capella get` – fetch one resource.

use anyhow::{Context, Result};
use capella_core::{Client, EndpointCfg};
use std::collections::HashMap;
use std::io::Write;

pub fn run_get(client: &Client, token: &str, url: &str) -> Result<()> {
    let endpoint = EndpointCfg::get(url);
    let response = client
        .execute_with_retry(&endpoint, None, token, &HashMap::new())
        .with_context(|| format!("GET {}", url))?;

    let mut out = std::io::stdout().lock();
    out.write_all(&response.body)?;
    writeln!(out)?;
    Ok(())
}
