//! Current weather for a city, resolved through an upstream geocoding API.

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod metrics_defs;

pub use client::WeatherClient;
pub use errors::{Result, WeatherError};
