//! Incident classification
//!
//! - `Classifier`: the capability `classify(text) -> raw response`
//! - `LlmClassifier`: HTTP implementation against an OpenAI-compatible endpoint
//! - `parse_classification`: tolerant extraction of category and priority

pub mod client;
pub mod error;
pub mod parser;

pub use client::LlmClassifier;
pub use error::{ClassificationError, ClassificationResult};
pub use parser::parse_classification;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// External text-classification capability.
///
/// Output is raw text that should resemble
/// `{"category":"...","priority":"..."}` but is not guaranteed well-formed.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> ClassificationResult<String>;
}

/// Classification endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of the chat completions API
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Upper bound on a single classification call (seconds)
    pub timeout_secs: u64,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 30,
            temperature: 0.0,
        }
    }
}
