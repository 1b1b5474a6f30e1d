//! CLI command handlers, one file per command.

mod get;
mod list;
mod wait_index;

pub use get::run_get;
pub use list::run_list;
pub use wait_index::run_wait_index;
