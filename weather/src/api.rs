use crate::client::{CurrentWeather, Place, WeatherClient};
use crate::errors::WeatherError;
use crate::metrics_defs::{LOOKUPS, UPSTREAM_DURATION};
use axum::Router;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::http::{cors_headers, error_response, json_response, method_not_allowed};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

pub const WEATHER_PATH: &str = "/api-weather";

const ALLOWED_METHODS: &str = "GET,OPTIONS";

#[derive(Clone)]
pub struct WeatherState {
    client: Arc<WeatherClient>,
    default_city: String,
}

impl WeatherState {
    pub fn new(client: WeatherClient, default_city: String) -> Self {
        WeatherState {
            client: Arc::new(client),
            default_city,
        }
    }
}

pub fn routes(state: WeatherState) -> Router {
    Router::new()
        .route(
            WEATHER_PATH,
            get(current_weather)
                .options(|| async { with_cors(StatusCode::OK.into_response()) })
                .head(|| async { with_cors(method_not_allowed()) })
                .fallback(|| async { with_cors(method_not_allowed()) }),
        )
        .with_state(state)
}

#[derive(Deserialize, Debug)]
struct Params {
    city: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    #[serde(rename = "temperature_C")]
    pub temperature_c: Option<f64>,
    pub windspeed_m_s: Option<f64>,
    pub weather_code: Option<i64>,
    pub time: Option<String>,
}

impl WeatherReport {
    fn new(place: Place, weather: CurrentWeather) -> Self {
        WeatherReport {
            city: place.name,
            temperature_c: weather.temperature,
            windspeed_m_s: weather.windspeed,
            weather_code: weather.weathercode,
            time: weather.time,
        }
    }
}

enum Lookup {
    Found(WeatherReport),
    UnknownCity,
    NoWeather,
}

async fn current_weather(
    State(state): State<WeatherState>,
    Query(params): Query<Params>,
) -> Response {
    let city = match params.city.filter(|c| !c.is_empty()) {
        Some(city) => city,
        None => {
            tracing::info!(city = %state.default_city, "No city provided, using default");
            state.default_city.clone()
        }
    };

    let started = Instant::now();
    let result = lookup(&state.client, &city).await;
    histogram!(UPSTREAM_DURATION).record(started.elapsed().as_secs_f64());

    let (outcome, response) = match result {
        Ok(Lookup::Found(report)) => ("found", json_response(StatusCode::OK, &report)),
        Ok(Lookup::UnknownCity) => (
            "unknown_city",
            error_response(StatusCode::NOT_FOUND, &format!("City '{city}' not found")),
        ),
        Ok(Lookup::NoWeather) => (
            "no_weather",
            error_response(StatusCode::BAD_GATEWAY, "Weather data unavailable"),
        ),
        Err(e) => {
            tracing::error!(error = %e, city = %city, "Weather lookup failed");
            (
                "upstream_error",
                error_response(StatusCode::BAD_GATEWAY, &e.to_string()),
            )
        }
    };
    counter!(LOOKUPS, "outcome" => outcome).increment(1);
    with_cors(response)
}

async fn lookup(client: &WeatherClient, city: &str) -> Result<Lookup, WeatherError> {
    let Some(place) = client.geocode(city).await? else {
        return Ok(Lookup::UnknownCity);
    };
    let Some(weather) = client.current_weather(place.latitude, place.longitude).await? else {
        return Ok(Lookup::NoWeather);
    };
    Ok(Lookup::Found(WeatherReport::new(place, weather)))
}

fn with_cors(mut response: Response) -> Response {
    response.headers_mut().extend(cors_headers(ALLOWED_METHODS));
    response
}
