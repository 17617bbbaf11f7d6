//! Typed failures reported by the engine's collaborators.
//!
//! Step failures never escape a run as `Err`; these errors are converted into a failed
//! step (text generation) or surfaced to the caller of the store APIs.

use thiserror::Error;

/// Failure reported by a [`crate::TextGenerator`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextGenerationError {
    /// No credentials were available when the client was built.
    #[error("Cannot generate text: Gemini API client is not initialized.")]
    NotConfigured,
    /// The service could not be reached or answered with an error.
    #[error("Could not generate response from AI. Details: {0}")]
    Request(String),
    /// The service answered but produced no usable text.
    #[error("AI returned an empty response.")]
    EmptyResponse,
}

/// Failure reported by an [`crate::AgentStore`].
#[derive(Debug, Error)]
pub enum AgentStoreError {
    /// I/O failure while reading or writing the store file.
    #[error("agent store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("agent store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
