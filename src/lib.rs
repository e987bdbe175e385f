pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod types;

// Application ports and their infrastructure adapters
pub mod app;
pub mod infra;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{Result, ScraperError};
pub use pipeline::Aggregator;
pub use types::{Match, Query, SearchReport};
