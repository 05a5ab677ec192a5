//! LLM provider abstraction layer.
//!
//! This module defines a common interface for different LLM backends
//! (OpenAI-compatible APIs, Ollama) to provide completions and embeddings.

mod types;
pub mod ollama;
pub mod openai;

// Re-export common types
pub use types::{Completion, CompletionRequest, Provider, ProviderError, Result, TokenUsage};

// Re-export provider implementations
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::{LlmConfig, ProviderKind};
use std::sync::Arc;

/// Builds the provider selected in the config.
///
/// # Errors
///
/// Returns [`ProviderError::MissingApiKey`] when the OpenAI backend is
/// selected and the key variable is unset.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn Provider>> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::from_env(
            &config.base_url,
            &config.api_key_env,
        )?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(&config.base_url))),
    }
}
