//! Embedding generation using LLM providers.
//!
//! This module provides functionality to convert text into vector embeddings
//! using provider embedding models.

use crate::models::EmbeddingModel;
use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The provider API returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The API response contained no embeddings.
    ///
    /// This typically indicates a problem with the model or request format.
    #[error("No embeddings returned")]
    NoEmbeddings,

    /// The model produced vectors of an unexpected size.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates vector embeddings for text using a provider embedding model.
///
/// Every vector is checked against the model's configured dimension.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: EmbeddingModel,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: EmbeddingModel, batch_size: usize) -> Self {
        Self {
            provider,
            model,
            batch_size: batch_size.max(1),
        }
    }

    /// Dimension of every vector this embedder returns.
    pub fn dimension(&self) -> usize {
        self.model.embedding_dim
    }

    /// Generates a vector embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider is unreachable or rejects the request
    /// - The provider returns no embeddings
    /// - The vector size does not match the configured model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbedderError::NoEmbeddings)
    }

    /// Embeds many texts, splitting them into provider-sized requests.
    ///
    /// The output has one vector per input, in input order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(batch = batch.len(), model = %self.model.id, "Embedding batch");
            let vectors = self.provider.embed(batch, &self.model.id).await?;

            if vectors.len() != batch.len() {
                return Err(EmbedderError::NoEmbeddings);
            }

            for vector in &vectors {
                if vector.len() != self.model.embedding_dim {
                    return Err(EmbedderError::DimensionMismatch {
                        expected: self.model.embedding_dim,
                        actual: vector.len(),
                    });
                }
            }

            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedProvider;

    fn model(dim: usize) -> EmbeddingModel {
        EmbeddingModel {
            embedding_dim: dim,
            ..EmbeddingModel::default()
        }
    }

    #[tokio::test]
    async fn test_embed_batch_splits_requests() {
        let provider = Arc::new(ScriptedProvider::new(8));
        let embedder = Embedder::new(provider.clone(), model(8), 3);

        let texts: Vec<String> = (0..7).map(|i| format!("text {i}")).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 7);
        assert_eq!(provider.embed_calls(), vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let provider = Arc::new(ScriptedProvider::new(4));
        let embedder = Embedder::new(provider, model(8), 10);

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            EmbedderError::DimensionMismatch { expected: 8, actual: 4 }
        ));
    }

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let provider = Arc::new(ScriptedProvider::new(16));
        let embedder = Embedder::new(provider, model(16), 10);

        let a = embedder.embed("supply chain").await.unwrap();
        let b = embedder.embed("supply chain").await.unwrap();
        assert_eq!(a, b);
    }
}
