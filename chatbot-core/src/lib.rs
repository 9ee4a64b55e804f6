//! Core library for the `chatbot` server.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Intent classification and the restricted calculator
//! - Abstractions over the outbound services (geocoding, forecast, completion)
//! - The reply composer that ties them together
//!
//! It is used by `chatbot-server`, but can also be embedded in other binaries or services.

pub mod bot;
pub mod calc;
pub mod classifier;
pub mod config;
pub mod extract;
pub mod model;
pub mod provider;
pub mod weather;

pub use bot::ChatBot;
pub use calc::{CalcError, evaluate};
pub use classifier::{Intent, SmalltalkKind, classify};
pub use config::{CompletionConfig, Config, ServerConfig, WeatherConfig};
pub use extract::extract_city;
pub use model::{ChatReply, CurrentConditions, Location, WeatherReport};
pub use provider::{CompletionClient, ForecastSource, Geocoder};
pub use weather::WeatherFetcher;
