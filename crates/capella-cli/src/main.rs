use capella_core::error::find_api_error;
use capella_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, logging to stderr: {:#}", e);
    }

    if let Err(err) = CliCommand::run_from_args() {
        match err.chain().find_map(find_api_error) {
            Some(api) => eprintln!("capella error: {}", api.complete_error()),
            None => eprintln!("capella error: {:#}", err),
        }
        std::process::exit(1);
    }
}
