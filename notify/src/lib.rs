//! Publish to a notification topic and manage its subscriptions.

pub mod api;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod topic;

pub use errors::{NotifyError, Result};
