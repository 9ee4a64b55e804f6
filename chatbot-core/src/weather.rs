use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    model::WeatherReport,
    provider::{ForecastSource, Geocoder},
};

/// Geocode a city, then look up its current conditions.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastSource>,
}

impl WeatherFetcher {
    pub fn new(geocoder: Arc<dyn Geocoder>, forecast: Arc<dyn ForecastSource>) -> Self {
        Self { geocoder, forecast }
    }

    /// `None` for unknown places and for any failed lookup; failures are logged, not raised.
    #[instrument(skip(self))]
    pub async fn fetch(&self, city: &str) -> Option<WeatherReport> {
        let location = match self.geocoder.geocode(city).await {
            Ok(Some(location)) => location,
            Ok(None) => {
                debug!("No geocoding match");
                return None;
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Geocoding failed");
                return None;
            }
        };

        match self.forecast.current(location.latitude, location.longitude).await {
            Ok(Some(conditions)) => Some(WeatherReport { location, conditions }),
            Ok(None) => {
                debug!(place = %location.name, "Forecast returned no current weather");
                None
            }
            Err(err) => {
                warn!(place = %location.name, error = %format!("{err:#}"), "Forecast lookup failed");
                None
            }
        }
    }
}

/// Short phrase for a WMO weather code.
pub fn describe_weather_code(code: Option<i64>) -> &'static str {
    match code {
        Some(0) => "clear",
        Some(1) => "mainly clear",
        Some(2) => "partly cloudy",
        Some(3) => "overcast",
        Some(45) => "fog",
        Some(48) => "depositing rime fog",
        Some(51) => "light drizzle",
        Some(53) => "drizzle",
        Some(55) => "dense drizzle",
        Some(61) => "light rain",
        Some(63) => "rain",
        Some(65) => "heavy rain",
        Some(71) => "light snow",
        Some(73) => "snow",
        Some(75) => "heavy snow",
        Some(80) => "rain showers",
        Some(81) => "heavy rain showers",
        Some(82) => "violent rain showers",
        _ => "conditions available",
    }
}
