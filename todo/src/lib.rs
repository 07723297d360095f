//! Task list endpoint backed by a key-value table.

pub mod api;
pub mod config;
pub mod errors;
pub mod item;
pub mod metrics_defs;
pub mod store;

pub use errors::{Result, TodoError};
pub use item::TodoItem;
