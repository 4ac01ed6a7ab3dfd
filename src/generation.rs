//! Client for the hosted chat-completion API that writes the posts.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::prompt::ServiceType;
use crate::retry::RetryPolicy;

const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_TOKENS: u32 = 1000;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct GenerationClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl GenerationClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
            retry: RetryPolicy::new(MAX_ATTEMPTS, RETRY_BASE_DELAY),
        }
    }

    /// Generate post text for the prompt, or fail after the retry budget.
    ///
    /// A missing API key fails immediately without a network call.
    pub async fn generate(&self, prompt: &str, service: ServiceType) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("AI_API_KEY is not configured");
        };

        debug!(
            service = service.as_str(),
            prompt_chars = prompt.chars().count(),
            "requesting post generation"
        );

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: MAX_TOKENS,
        };

        let text = self
            .retry
            .run(|| {
                let request = self
                    .http
                    .post(&self.base_url)
                    .bearer_auth(api_key)
                    .json(&body)
                    .timeout(ATTEMPT_TIMEOUT);
                async move {
                    let response = request.send().await.context("generation request failed")?;
                    let status = response.status();
                    if !status.is_success() {
                        let error_body = response.text().await.unwrap_or_default();
                        bail!("generation API returned {status}: {error_body}");
                    }
                    let parsed: ChatResponse = response
                        .json()
                        .await
                        .context("failed to parse the generation response")?;
                    parsed
                        .choices
                        .first()
                        .map(|choice| choice.message.content.trim().to_string())
                        .filter(|content| !content.is_empty())
                        .context("generation response contained no text")
                }
            })
            .await?;

        info!(chars = text.chars().count(), "generated post text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_fails_without_a_network_call() {
        // An unroutable base URL proves no request is ever attempted
        let client = GenerationClient::new("http://192.0.2.1/v1/chat", "test-model", None);
        let result = client
            .generate("Напиши пост", ServiceType::ManicurePedicure)
            .await;
        let error = result.unwrap_err().to_string();
        assert!(error.contains("AI_API_KEY"), "unexpected error: {error}");
    }
}
