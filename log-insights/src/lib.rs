//! Access log endpoint: writes structured entries to the log stream and reads
//! them back through an asynchronous log-search query.

pub mod api;
pub mod backend;
pub mod config;
pub mod errors;
pub mod extract;
pub mod metrics_defs;
pub mod pipeline;
pub mod poller;
pub mod query;
pub mod records;
pub mod writer;

#[cfg(test)]
mod testutils;

pub use errors::{LogQueryError, Result};
pub use pipeline::LogPipeline;
