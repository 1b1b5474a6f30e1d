pub mod config;
pub mod logging;

pub mod client;
pub mod error;
pub mod index;
pub mod pagination;
pub mod poll;
pub mod retry;
pub mod transport;

pub use client::Client;
pub use error::{ApiError, ClientError};
pub use transport::{EndpointCfg, Method, Response};
