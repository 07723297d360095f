use crate::config::Config;
use crate::errors::Result;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// A geocoding match
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub weathercode: Option<i64>,
    pub time: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<Place>>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current_weather: Option<Map<String, Value>>,
}

#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    geocode_url: Url,
    forecast_url: Url,
}

impl WeatherClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(WeatherClient {
            client,
            geocode_url: config.geocode_url.clone(),
            forecast_url: config.forecast_url.clone(),
        })
    }

    /// Best match for `city`, if the geocoder knows it.
    pub async fn geocode(&self, city: &str) -> Result<Option<Place>> {
        let mut url = self.geocode_url.clone();
        url.query_pairs_mut()
            .append_pair("name", city)
            .append_pair("count", "1");

        let response: GeocodeResponse = self.get_json(url).await?;
        Ok(response.results.into_iter().flatten().next())
    }

    pub async fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<CurrentWeather>> {
        let mut url = self.forecast_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &latitude.to_string())
            .append_pair("longitude", &longitude.to_string())
            .append_pair("current_weather", "true");

        // An empty `current_weather` object counts as no reading at all
        let response: ForecastResponse = self.get_json(url).await?;
        match response.current_weather {
            Some(fields) if !fields.is_empty() => {
                Ok(Some(serde_json::from_value(Value::Object(fields))?))
            }
            _ => Ok(None),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::info!(url = %url, "Fetching URL");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
