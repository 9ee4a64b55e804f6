//! Turns a chat message into exactly one reply.
//!
//! Selection order: weather report, calculation result, language-model
//! completion (when configured), canned smalltalk, generic fallback. A weather
//! question whose lookup comes back empty continues down that list.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    Config,
    calc::{evaluate, format_number},
    classifier::{Intent, SmalltalkKind, classify, smalltalk_kind},
    model::ChatReply,
    provider::{CompletionClient, completion_from_config, weather_provider_from_config},
    weather::WeatherFetcher,
};

pub const FALLBACK_REPLY: &str = "Got it! (Tip: try 'weather in Berlin')";
pub const CALCULATION_ERROR_REPLY: &str = "Sorry, I couldn't calculate that.";
pub const COMPLETION_ERROR_REPLY: &str = "Sorry, I couldn't reach the language model right now.";

#[derive(Debug, Clone)]
pub struct ChatBot {
    weather: WeatherFetcher,
    completion: Option<Arc<dyn CompletionClient>>,
}

impl ChatBot {
    pub fn new(weather: WeatherFetcher, completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { weather, completion }
    }

    /// Wire up the real Open-Meteo and completion clients.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let open_meteo = weather_provider_from_config(config)?;
        let weather = WeatherFetcher::new(open_meteo.clone(), open_meteo);
        Ok(Self::new(weather, completion_from_config(config)?))
    }

    pub fn completion_enabled(&self) -> bool {
        self.completion.is_some()
    }

    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn reply(&self, message: &str) -> ChatReply {
        let text = message.trim();
        if text.is_empty() {
            return ChatReply::new(FALLBACK_REPLY);
        }

        let intent = classify(text);
        debug!(?intent, "Classified message");

        match intent {
            Intent::Weather { city } => match self.weather.fetch(&city).await {
                Some(report) => ChatReply::new(report.to_string()),
                None => self.fall_through(text, smalltalk_kind(text)).await,
            },
            Intent::Calculation { expression } => ChatReply::new(calculate(&expression)),
            Intent::Smalltalk(kind) => self.fall_through(text, Some(kind)).await,
            Intent::Fallback => self.fall_through(text, None).await,
        }
    }

    async fn fall_through(&self, text: &str, smalltalk: Option<SmalltalkKind>) -> ChatReply {
        if let Some(completion) = &self.completion {
            return ChatReply::new(match completion.complete(text).await {
                Ok(answer) if !answer.is_empty() => answer,
                Ok(_) => {
                    warn!("Completion service returned an empty answer");
                    COMPLETION_ERROR_REPLY.to_string()
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "Completion request failed");
                    COMPLETION_ERROR_REPLY.to_string()
                }
            });
        }

        ChatReply::new(smalltalk.map_or(FALLBACK_REPLY, |kind| kind.reply()))
    }
}

fn calculate(expression: &str) -> String {
    match evaluate(expression) {
        Ok(value) => format!("Result: {}", format_number(value)),
        Err(err) => {
            debug!(%err, expression, "Calculation rejected");
            CALCULATION_ERROR_REPLY.to_string()
        }
    }
}
