//! Shared fixtures for unit tests.

use crate::config::Config;
use crate::knowledge::{CatalogProduct, CompanyContext, Dataset, DatasetSource, KnowledgeBase};
use crate::rag::{Embedder, MemoryIndex, VectorStore};
use std::sync::Arc;
use crate::models::EmbeddingModel;
use crate::provider::{Completion, CompletionRequest, Provider, ProviderError, Result, TokenUsage};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

pub(crate) const TEST_DIM: usize = 64;

/// Provider that replays queued completions and embeds text as a hashed
/// bag of words, so texts sharing words land close together.
pub(crate) struct ScriptedProvider {
    dim: usize,
    completions: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    embed_calls: Mutex<Vec<usize>>,
    unavailable: bool,
}

impl ScriptedProvider {
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            dim,
            completions: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            embed_calls: Mutex::new(Vec::new()),
            unavailable: false,
        }
    }

    /// A provider whose every call fails as if the service were down.
    pub(crate) fn unavailable(dim: usize) -> Self {
        Self {
            unavailable: true,
            ..Self::new(dim)
        }
    }

    pub(crate) fn with_completions<I, S>(self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completions
            .lock()
            .unwrap()
            .extend(texts.into_iter().map(Into::into));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn embed_calls(&self) -> Vec<usize> {
        self.embed_calls.lock().unwrap().clone()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() as usize) % self.dim] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            vector[0] = 1.0;
            return vector;
        }
        vector.iter().map(|v| v / norm).collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        if self.unavailable {
            return Err(ProviderError::Api("503 Service Unavailable".to_string()));
        }

        let prompt_tokens = (request.prompt.len() / 4) as u32;
        self.prompts.lock().unwrap().push(request.prompt);

        let text = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::Other("no scripted completion left".to_string()))?;

        let usage = TokenUsage::new(prompt_tokens, (text.len() / 4) as u32);
        Ok(Completion { text, usage })
    }

    async fn embed(&self, texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
        if self.unavailable {
            return Err(ProviderError::Api("503 Service Unavailable".to_string()));
        }

        self.embed_calls.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Default config shrunk to the test embedding dimension and fast polling.
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.rag.embedding_model = EmbeddingModel {
        embedding_dim: TEST_DIM,
        ..EmbeddingModel::default()
    };
    config.storage.ready_attempts = 3;
    config.storage.ready_poll_interval_ms = 1;
    config
}

/// A catalog row with mid-sized implementation facts.
pub(crate) fn catalog_product(name: &str, category: &str, industries: &[&str]) -> CatalogProduct {
    CatalogProduct {
        product_name: name.to_string(),
        description: format!("{name} for {category}"),
        category: category.to_string(),
        target_industries: industries.iter().map(|s| s.to_string()).collect(),
        implementation_months_min: Some(6),
        implementation_months_max: Some(12),
        price_min: Some(250_000.0),
        price_max: Some(400_000.0),
    }
}

/// Company `42`, a manufacturer with stated challenges and no files or deals.
pub(crate) fn sample_company() -> CompanyContext {
    CompanyContext {
        id: Some("42".to_string()),
        name: "Acme Manufacturing".to_string(),
        industry: "Manufacturing".to_string(),
        size: "Large (1000-4999 employees)".to_string(),
        region: "North America".to_string(),
        challenges: Some("Disconnected supply chain systems and manual procurement".to_string()),
        current_systems: Some("SAP ECC 6.0".to_string()),
        budget: Some("$1M - $2M".to_string()),
        timeline: Some("12 months".to_string()),
        uploaded_files: Vec::new(),
        deals: Vec::new(),
    }
}

/// A knowledge base over an in-memory index and the given dataset.
pub(crate) fn memory_knowledge_base(dataset: Dataset) -> (KnowledgeBase, VectorStore) {
    knowledge_base(ScriptedProvider::new(TEST_DIM), dataset)
}

/// A knowledge base whose embedding provider is down.
pub(crate) fn unavailable_knowledge_base() -> (KnowledgeBase, VectorStore) {
    knowledge_base(ScriptedProvider::unavailable(TEST_DIM), Dataset::default())
}

fn knowledge_base(provider: ScriptedProvider, dataset: Dataset) -> (KnowledgeBase, VectorStore) {
    let config = test_config();
    let embedder = Embedder::new(Arc::new(provider), config.rag.embedding_model.clone(), 100);
    let store = VectorStore::new(Arc::new(MemoryIndex::new("test")), embedder, &config.storage);
    let source = Arc::new(DatasetSource::new(dataset));
    let kb = KnowledgeBase::new(store.clone(), source, &config).expect("valid test config");
    (kb, store)
}
