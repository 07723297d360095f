use thiserror::Error;

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Unexpected upstream payload: {0}")]
    Payload(#[from] serde_json::Error),
}
