//! Ollama provider implementation.
//!
//! This module provides an Ollama HTTP API client that implements the Provider trait.

use super::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ollama HTTP API provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider for the daemon at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new("http://localhost:11434")
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let url = format!("{}/api/chat", self.base_url);

        let ollama_request = OllamaChatRequest {
            model: request.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: request.prompt,
            }],
            options: {
                let mut opts = HashMap::new();
                opts.insert("temperature".to_string(), serde_json::json!(request.temperature));
                opts.insert("num_predict".to_string(), serde_json::json!(request.max_tokens));
                opts
            },
            stream: false,
        };

        let response = self.http_client.post(&url).json(&ollama_request).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Api(error_text));
        }

        let ollama_response = response.json::<OllamaChatResponse>().await?;

        Ok(Completion {
            text: ollama_response.message.content,
            usage: TokenUsage::new(
                ollama_response.prompt_eval_count,
                ollama_response.eval_count,
            ),
        })
    }

    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);

        let embed_request = OllamaEmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let response = self.http_client.post(&url).json(&embed_request).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Api(error_text));
        }

        let embed_response = response.json::<OllamaEmbedResponse>().await?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(ProviderError::Other(format!(
                "Ollama returned {} embeddings for {} inputs",
                embed_response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(embed_response.embeddings)
    }
}

// Ollama-specific request/response types (internal)

#[derive(Debug, Clone, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    options: HashMap<String, serde_json::Value>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_token_counts_default_to_zero() {
        let raw = r#"{"model":"llama3.2","message":{"role":"assistant","content":"ok"},"done":true}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.prompt_eval_count, 0);
        assert_eq!(parsed.message.content, "ok");
    }

    #[tokio::test]
    async fn test_embed_empty_input_skips_request() {
        let provider = OllamaProvider::new("http://127.0.0.1:1");
        let embeddings = provider.embed(&[], "nomic-embed-text").await.unwrap();
        assert!(embeddings.is_empty());
    }
}
