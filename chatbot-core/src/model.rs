use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{calc::format_number, weather::describe_weather_code};

/// Top geocoding match for a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions at a coordinate, in the location's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: Option<i64>,
    pub observed_at: Option<NaiveDateTime>,
}

/// Everything needed to answer a weather question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Location,
    pub conditions: CurrentConditions,
}

impl WeatherReport {
    pub fn condition(&self) -> &'static str {
        describe_weather_code(self.conditions.weather_code)
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weather for {}, {}: {}°C, {}, wind {} km/h.",
            self.location.name,
            self.location.country,
            format_number(self.conditions.temperature_c),
            self.condition(),
            format_number(self.conditions.wind_speed_kmh),
        )
    }
}

/// The single reply produced for a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

impl fmt::Display for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reply)
    }
}
