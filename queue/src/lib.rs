//! Send, receive and acknowledge messages on a single queue.

pub mod api;
pub mod backend;
pub mod config;
pub mod errors;
pub mod metrics_defs;

pub use errors::{QueueError, Result};
