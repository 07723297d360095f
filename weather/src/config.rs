use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Upstream timeout cannot be 0")]
    ZeroTimeout,

    #[error("Default city cannot be empty")]
    EmptyDefaultCity,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Geocoding endpoint, queried with `name` and `count`
    pub geocode_url: Url,
    /// Forecast endpoint, queried with `latitude`, `longitude` and `current_weather`
    pub forecast_url: Url,
    /// City used when the request names none
    pub default_city: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            geocode_url: Url::parse("https://geocoding-api.open-meteo.com/v1/search")
                .expect("valid default geocode url"),
            forecast_url: Url::parse("https://api.open-meteo.com/v1/forecast")
                .expect("valid default forecast url"),
            default_city: "Buenos Aires".to_string(),
            timeout_secs: 10,
            user_agent: concat!("api-weather/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        if self.default_city.trim().is_empty() {
            return Err(ValidationError::EmptyDefaultCity);
        }
        Ok(())
    }
}
