//! CLI for the Capella client layer.

mod commands;

use anyhow::{bail, Result};
use capella_core::config;
use capella_core::index::{WatchOptions, INDEX_READY};
use capella_core::pagination::SORT_BY_ID;
use capella_core::Client;
use clap::{Parser, Subcommand};

use commands::{run_get, run_list, run_wait_index};

/// Top-level CLI for the Capella API client.
#[derive(Debug, Parser)]
#[command(name = "capella")]
#[command(about = "Capella: resilient client for the Capella cloud REST API", long_about = None)]
pub struct Cli {
    /// API token sent as a bearer credential.
    #[arg(long, global = true, env = "CAPELLA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL (overrides `host` from config.toml).
    #[arg(long, global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// GET one resource and print its body.
    Get {
        /// Path below the API host (e.g. /v4/organizations) or a full URL.
        path: String,
    },

    /// Fetch every page of a list endpoint and print the items as a JSON array.
    List {
        /// Path below the API host or a full URL.
        path: String,

        /// Sort key passed as `sortBy`; empty to omit.
        #[arg(long, default_value = SORT_BY_ID)]
        sort_by: String,

        /// Items per page (default from config).
        #[arg(long, value_name = "N")]
        per_page: Option<u32>,
    },

    /// Wait until the given indexes finish building.
    WaitIndex {
        #[arg(long)]
        org: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        scope: String,
        #[arg(long)]
        collection: String,

        /// Build status to wait for.
        #[arg(long, default_value = INDEX_READY)]
        state: String,

        /// Index names, checked one after another.
        #[arg(required = true)]
        indexes: Vec<String>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(host) = cli.host {
            cfg.host = host;
        }
        tracing::debug!("loaded config: {:?}", cfg);

        let Some(token) = cli.token.filter(|t| !t.is_empty()) else {
            bail!("no API token: pass --token or set CAPELLA_TOKEN");
        };
        let client = Client::from_config(&cfg);

        match cli.command {
            CliCommand::Get { path } => run_get(&client, &token, &resolve_url(&cfg.host, &path))?,
            CliCommand::List {
                path,
                sort_by,
                per_page,
            } => {
                let per_page = per_page.unwrap_or(cfg.page_size);
                run_list(
                    &client,
                    &token,
                    &resolve_url(&cfg.host, &path),
                    per_page,
                    &sort_by,
                )?;
            }
            CliCommand::WaitIndex {
                org,
                project,
                cluster,
                bucket,
                scope,
                collection,
                state,
                indexes,
            } => {
                let opts = WatchOptions {
                    host: cfg.host.clone(),
                    org_id: org,
                    project_id: project,
                    cluster_id: cluster,
                    bucket,
                    scope,
                    collection,
                };
                run_wait_index(&client, &token, &cfg.poll_config(), &opts, &state, &indexes)?;
            }
        }

        Ok(())
    }
}

/// Full URLs pass through; anything else is joined onto `host`.
pub(crate) fn resolve_url(host: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests;
