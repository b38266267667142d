use async_trait::async_trait;
use serde_json::json;

use crate::model::TextModel;
use postforge_types::{PostforgeError, Result};

// ---------------------------------------------------------------------------
// GeminiModel
// ---------------------------------------------------------------------------

/// Gemini adapter over the Google Generative Language HTTP API.
#[derive(Debug)]
pub struct GeminiModel {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl GeminiModel {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
        }
    }

    /// Read the API key from `GOOGLE_API_KEY` or `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| PostforgeError::Auth {
                model: "gemini".into(),
            })?;
        Ok(Self::new(key))
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn parse_response(&self, body: serde_json::Value) -> Result<String> {
        let parts = body["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| PostforgeError::Model {
                model: self.model.clone(),
                message: "missing candidates in response".into(),
                retryable: false,
            })?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(PostforgeError::Model {
                model: self.model.clone(),
                message: "empty text in response".into(),
                retryable: false,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Gemini request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PostforgeError::Model {
                model: self.model.clone(),
                message: e.to_string(),
                retryable: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PostforgeError::Model {
                model: self.model.clone(),
                // 429 and 5xx are worth retrying at the transport level
                retryable: status.as_u16() == 429 || status.is_server_error(),
                message: format!("HTTP {}: {}", status.as_u16(), message),
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| PostforgeError::Model {
                model: self.model.clone(),
                message: format!("invalid JSON body: {e}"),
                retryable: false,
            })?;

        self.parse_response(body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
