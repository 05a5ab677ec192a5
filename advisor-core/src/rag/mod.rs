//! Retrieval layer: chunking, embedding and vector storage.
//!
//! # Architecture
//!
//! - [`chunker`]: splits long text into overlapping, sentence-aware chunks
//! - [`Embedder`]: turns text into vectors through a [`Provider`]
//! - [`VectorStore`]: embeds, batches and searches over a [`VectorIndex`]
//! - backends: Qdrant over gRPC, or an in-process memory index
//!
//! The knowledge base built on top of this lives in [`crate::knowledge`].

pub mod chunker;
mod embedder;
mod memory_store;
mod qdrant_store;
mod store;
mod types;

pub use chunker::{ChunkError, Chunker, Chunks};
pub use embedder::{Embedder, EmbedderError};
pub use memory_store::MemoryIndex;
pub use qdrant_store::QdrantIndex;
pub use store::{create_vector_index, VectorIndex, VectorStore};
pub use types::{
    EmbeddingChunk, FilterCondition, IndexStats, Metadata, MetadataFilter, VectorSearchResult,
};

use crate::config::Config;
use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),

    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Vector store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("Vector index {index} not ready after {attempts} polls")]
    IndexNotReady { index: String, attempts: u32 },
}

impl RagError {
    /// Whether the failure came from an unreachable or failing backend
    /// (embedding provider or vector database).
    pub fn is_provider_unavailable(&self) -> bool {
        match self {
            RagError::Embedder(EmbedderError::Provider(err)) => {
                !matches!(err, ProviderError::Json(_) | ProviderError::MissingApiKey(_))
            }
            RagError::Store(_) | RagError::IndexNotReady { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

/// Builds the configured vector store on top of `provider`'s embeddings.
///
/// # Example
///
/// ```no_run
/// # use advisor_core::{Config, rag, provider::OllamaProvider};
/// # use std::sync::Arc;
/// # fn example() -> rag::Result<()> {
/// let config = Config::default();
/// let provider = Arc::new(OllamaProvider::new(&config.llm.base_url));
/// let store = rag::build_vector_store(&config, provider)?;
/// # Ok(())
/// # }
/// ```
pub fn build_vector_store(config: &Config, provider: Arc<dyn Provider>) -> Result<VectorStore> {
    let embedder = Embedder::new(
        provider,
        config.rag.embedding_model.clone(),
        config.rag.embed_batch_size,
    );
    let index = create_vector_index(&config.storage)?;
    Ok(VectorStore::new(index, embedder, &config.storage))
}
