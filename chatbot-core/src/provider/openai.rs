use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::CompletionConfig;

use super::CompletionClient;

/// OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompletion {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

// Keeps the key out of logs.
impl std::fmt::Debug for OpenAiCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompletion")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for the completion service")?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[derive(Debug, Serialize)]
struct OaRequest<'a> {
    model: &'a str,
    messages: [OaMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct OaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OaResponse {
    #[serde(default)]
    choices: Vec<OaChoice>,
}

#[derive(Debug, Deserialize)]
struct OaChoice {
    message: OaChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OaChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, "Requesting completion");

        let request = OaRequest {
            model: &self.model,
            messages: [OaMessage { role: "user", content: prompt }],
        };

        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the completion service")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read completion response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Completion request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OaResponse =
            serde_json::from_str(&body).context("Failed to parse completion JSON")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("Completion response contained no choices"))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_api_key() {
        let client = OpenAiCompletion::new(&CompletionConfig::default(), "sk-secret".into())
            .expect("client creation should succeed");
        let debug = format!("{client:?}");
        assert!(debug.contains("gpt-3.5-turbo"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn request_body_shape() {
        let request = OaRequest {
            model: "m",
            messages: [OaMessage { role: "user", content: "hi" }],
        };
        let json = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(
            json,
            serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})
        );
    }
}
