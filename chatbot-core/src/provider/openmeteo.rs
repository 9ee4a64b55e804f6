use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::WeatherConfig,
    model::{CurrentConditions, Location},
};

use super::{ForecastSource, Geocoder};

/// Open-Meteo geocoding and forecast APIs. Neither needs an API key.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    config: WeatherConfig,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for Open-Meteo")?;

        Ok(Self { config, http })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(url, ?query, "Calling Open-Meteo {what}");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Open-Meteo ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse Open-Meteo {what} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    #[serde(default)]
    results: Vec<OmPlace>,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    #[serde(default)]
    current_weather: Option<OmCurrentWeather>,
}

#[derive(Debug, Default, Deserialize)]
struct OmCurrentWeather {
    time: Option<String>,
    temperature: Option<f64>,
    windspeed: Option<f64>,
    weathercode: Option<f64>,
}

impl OmCurrentWeather {
    fn is_empty(&self) -> bool {
        self.time.is_none()
            && self.temperature.is_none()
            && self.windspeed.is_none()
            && self.weathercode.is_none()
    }
}

#[async_trait]
impl Geocoder for OpenMeteoProvider {
    #[instrument(skip(self))]
    async fn geocode(&self, place: &str) -> Result<Option<Location>> {
        let url = format!("{}/search", self.config.geocoding_url);
        let parsed: OmGeocodingResponse = self
            .get_json(
                "geocoding",
                &url,
                &[
                    ("name", place.to_string()),
                    ("count", "1".to_string()),
                    ("language", self.config.language.clone()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        Ok(parsed.results.into_iter().next().map(|p| Location {
            name: p.name,
            country: p.country.unwrap_or_default(),
            latitude: p.latitude,
            longitude: p.longitude,
        }))
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoProvider {
    #[instrument(skip(self))]
    async fn current(&self, latitude: f64, longitude: f64) -> Result<Option<CurrentConditions>> {
        let url = format!("{}/forecast", self.config.forecast_url);
        let parsed: OmForecastResponse = self
            .get_json(
                "forecast",
                &url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("current_weather", "true".to_string()),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        let current = parsed.current_weather.unwrap_or_default();
        if current.is_empty() {
            return Ok(None);
        }

        let (Some(temperature_c), Some(wind_speed_kmh)) = (current.temperature, current.windspeed)
        else {
            return Err(anyhow!(
                "Open-Meteo current weather is missing temperature or wind speed"
            ));
        };

        Ok(Some(CurrentConditions {
            temperature_c,
            wind_speed_kmh,
            weather_code: current.weathercode.map(|c| c as i64),
            observed_at: current.time.as_deref().and_then(parse_local_time),
        }))
    }
}

/// Open-Meteo reports local time as `2024-01-15T12:00`.
fn parse_local_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
