//! Text generation collaborator.
//!
//! `ai.*` steps delegate to a [`TextGenerator`]. The production implementation wraps the
//! Gemini client; tests substitute scripted generators.

use agentflow_api::GeminiClient;
use async_trait::async_trait;
use tracing::warn;

use crate::error::TextGenerationError;

/// Produces text for a prompt, optionally steered by a system instruction.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String, TextGenerationError>;
}

/// [`TextGenerator`] backed by the Gemini `generateContent` API.
pub struct GeminiTextGenerator {
    client: GeminiClient,
}

impl GeminiTextGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    async fn generate_text(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String, TextGenerationError> {
        if !self.client.is_configured() {
            warn!("text generation requested without an API key");
            return Err(TextGenerationError::NotConfigured);
        }

        let text = self
            .client
            .generate_content(prompt, system_instruction)
            .await
            .map_err(|error| {
                warn!(error = %error, model = %self.client.model, "text generation failed");
                TextGenerationError::Request(format!("{error:#}"))
            })?;

        if text.trim().is_empty() {
            return Err(TextGenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        let client = GeminiClient::new("http://localhost:9", "test-model", None).expect("build client");
        let generator = GeminiTextGenerator::new(client);

        let error = generator.generate_text("hello", None).await.unwrap_err();

        assert_eq!(error, TextGenerationError::NotConfigured);
        assert_eq!(error.to_string(), "Cannot generate text: Gemini API client is not initialized.");
    }
}
