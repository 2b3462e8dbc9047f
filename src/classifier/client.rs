use crate::classifier::error::{ClassificationError, ClassificationResult};
use crate::classifier::{Classifier, ClassifierConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Classifier backed by an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmClassifier {
    client: Client,
    config: ClassifierConfig,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl LlmClassifier {
    /// Create a classifier, reading the API key from the configured environment variable
    pub fn new(config: ClassifierConfig) -> ClassificationResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ClassificationError::Configuration(
                "classifier endpoint is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ClassificationError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());

        if api_key.is_none() {
            tracing::warn!(
                api_key_env = ?config.api_key_env,
                "No classifier API key found; requests will be sent unauthenticated"
            );
        }

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Override the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Directive prompt embedding the incident description
    pub fn build_prompt(description: &str) -> String {
        format!(
            "Analyze the following incident description and provide a JSON response with \
             'category' (INFRASTRUCTURE, SAFETY, SANITATION, OTHER) and \
             'priority' (LOW, MEDIUM, HIGH). Description: {}",
            description
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    async fn send(&self, text: &str) -> ClassificationResult<String> {
        let prompt = Self::build_prompt(text);
        let body = ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassificationError::Timeout(self.timeout_ms())
            } else {
                ClassificationError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Provider {
                status: status.as_u16(),
                message: message.chars().take(512).collect(),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| {
                ClassificationError::InvalidResponse(format!("Failed to parse response: {}", e))
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ClassificationError::InvalidResponse("response has no message content".to_string())
            })
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout_secs * 1000
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text: &str) -> ClassificationResult<String> {
        let bound = Duration::from_secs(self.config.timeout_secs);

        let raw = tokio::time::timeout(bound, self.send(text))
            .await
            .map_err(|_| ClassificationError::Timeout(self.timeout_ms()))??;

        debug!(response_length = raw.len(), model = %self.config.model, "Classifier responded");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_description() {
        let prompt = LlmClassifier::build_prompt("Pothole on Main St");
        assert!(prompt.ends_with("Description: Pothole on Main St"));
        assert!(prompt.contains("INFRASTRUCTURE, SAFETY, SANITATION, OTHER"));
        assert!(prompt.contains("LOW, MEDIUM, HIGH"));
    }

    #[test]
    fn test_completions_url() {
        let config = ClassifierConfig {
            endpoint: "http://localhost:1234/v1/".to_string(),
            api_key_env: None,
            ..Default::default()
        };
        let classifier = LlmClassifier::new(config).unwrap();
        assert_eq!(classifier.completions_url(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let config = ClassifierConfig {
            endpoint: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            LlmClassifier::new(config),
            Err(ClassificationError::Configuration(_))
        ));
    }
}
