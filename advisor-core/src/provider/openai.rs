//! OpenAI-compatible provider implementation.
//!
//! Talks to `/chat/completions` and `/embeddings` on any endpoint that speaks
//! the OpenAI wire format.

use super::types::*;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// OpenAI HTTP API provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    base_url: String,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a provider authenticated with the given API key.
    pub fn new(base_url: impl Into<String>, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Other("empty OpenAI API key".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| ProviderError::Other("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Reads the API key from `key_env` and builds the provider.
    pub fn from_env(base_url: impl Into<String>, key_env: &str) -> Result<Self> {
        let api_key =
            std::env::var(key_env).map_err(|_| ProviderError::MissingApiKey(key_env.to_string()))?;
        Self::new(base_url, &api_key)
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http_client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{status}: {error_text}")));
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response: ChatCompletionResponse = self.post("chat/completions", &body).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Other("completion returned no choices".to_string()))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(model = %request.model, total_tokens = usage.total_tokens, "Completion received");
        Ok(Completion { text, usage })
    }

    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            model,
            input: texts,
            encoding_format: "float",
        };

        let mut response: EmbeddingResponse = self.post("embeddings", &body).await?;
        response.data.sort_by_key(|entry| entry.index);

        if response.data.len() != texts.len() {
            return Err(ProviderError::Other(format!(
                "OpenAI returned {} embeddings for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }

        Ok(response.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

// OpenAI wire types (internal)

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(OpenAiProvider::new("https://api.openai.com/v1", "  ").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = OpenAiProvider::new("http://localhost:8080/v1/", "sk-test").unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_missing_key_env() {
        let err = OpenAiProvider::from_env("http://localhost", "ADVISOR_TEST_KEY_NOT_SET").unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey(name) if name == "ADVISOR_TEST_KEY_NOT_SET"));
    }

    #[test]
    fn test_completion_response_without_usage() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("[]"));
    }
}
