use crate::{
    Config,
    model::{CurrentConditions, Location},
    provider::{openai::OpenAiCompletion, openmeteo::OpenMeteoProvider},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openai;
pub mod openmeteo;

/// Resolve a place name to its highest-ranked match.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// `Ok(None)` when the service knows no such place.
    async fn geocode(&self, place: &str) -> anyhow::Result<Option<Location>>;
}

/// Current conditions for a coordinate.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    /// `Ok(None)` when the service returned no current data.
    async fn current(&self, latitude: f64, longitude: f64)
    -> anyhow::Result<Option<CurrentConditions>>;
}

/// Free-text completion from a language model.
#[async_trait]
pub trait CompletionClient: Send + Sync + Debug {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Construct the Open-Meteo provider from the `[weather]` section.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Arc<OpenMeteoProvider>> {
    Ok(Arc::new(OpenMeteoProvider::new(config.weather.clone())?))
}

/// Construct the completion client, or `None` when the fallback is off or has no key.
pub fn completion_from_config(
    config: &Config,
) -> anyhow::Result<Option<Arc<dyn CompletionClient>>> {
    let completion = &config.completion;
    if !completion.enabled {
        return Ok(None);
    }

    let Some(api_key) = completion.api_key() else {
        tracing::warn!("Completion fallback is enabled but no API key is configured; ignoring it");
        return Ok(None);
    };

    let client = OpenAiCompletion::new(completion, api_key.to_owned())?;
    Ok(Some(Arc::new(client)))
}
