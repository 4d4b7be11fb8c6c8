//! OpenWeatherMap 5-day / 3-hour forecast client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Coordinate, ForecastSnapshot, Units, WeatherError};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
const FORECAST_PATH: &str = "data/2.5/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Remote source of forecasts.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the forecast for one coordinate.
    async fn fetch_forecast(&self, coordinate: Coordinate)
        -> Result<ForecastSnapshot, WeatherError>;
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    units: Units,
}

impl OpenWeatherClient {
    pub fn new(api_key: &str, units: Units) -> Result<Self, WeatherError> {
        Self::new_with_base_url(api_key, units, OPENWEATHER_BASE_URL)
    }

    pub fn new_with_base_url(
        api_key: &str,
        units: Units,
        base_url: &str,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            units,
        })
    }

    async fn error_from_response(response: reqwest::Response) -> WeatherError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return WeatherError::InvalidApiKey;
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);

        WeatherError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// The request URL carries `appid`; drop it before the error is logged
/// or shown.
fn redact(err: reqwest::Error) -> WeatherError {
    WeatherError::Network(err.without_url())
}

#[async_trait]
impl ForecastSource for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(
        &self,
        coordinate: Coordinate,
    ) -> Result<ForecastSnapshot, WeatherError> {
        let url = format!("{}/{}", self.base_url, FORECAST_PATH);
        tracing::debug!("GET {} ({})", url, coordinate);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("units", self.units.as_query_value().to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(redact)?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            tracing::warn!("Forecast request failed: {}", err);
            return Err(err);
        }

        let body = response.text().await.map_err(redact)?;
        let snapshot: ForecastSnapshot =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::info!(
            "Fetched {} forecast entries for {}",
            snapshot.list.len(),
            snapshot.city.name
        );
        Ok(snapshot)
    }
}
