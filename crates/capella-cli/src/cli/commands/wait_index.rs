//! `capella wait-index` – block until index builds reach a state.

use anyhow::{Context, Result};
use capella_core::index::{self, WatchOptions};
use capella_core::poll::{PollConfig, Poller};
use capella_core::Client;

pub fn run_wait_index(
    client: &Client,
    token: &str,
    poll: &PollConfig,
    opts: &WatchOptions,
    state: &str,
    indexes: &[String],
) -> Result<()> {
    let poller = Poller::new(*poll);
    index::watch_indexes(client, token, state, indexes, opts, &poller).with_context(|| {
        format!(
            "waiting for {} index(es) on cluster {} to reach {}",
            indexes.len(),
            opts.cluster_id,
            state
        )
    })?;
    println!("{} index(es) {}", indexes.len(), state);
    Ok(())
}
