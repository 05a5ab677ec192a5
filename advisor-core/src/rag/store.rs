//! Vector store abstraction and factory.
//!
//! [`VectorIndex`] is the backend seam (Qdrant over gRPC, or the in-process
//! memory index). [`VectorStore`] sits on top of it and owns the parts every
//! backend shares: embedding chunks that arrive without vectors, batching
//! writes, and waiting for a freshly created index to come up.

use super::embedder::Embedder;
use super::memory_store::MemoryIndex;
use super::qdrant_store::QdrantIndex;
use super::types::{EmbeddingChunk, IndexStats, MetadataFilter, VectorSearchResult};
use super::{RagError, Result};
use crate::config::{StorageConfig, StorageMode};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Unified interface for vector database backends.
///
/// Implementations only see chunks that already carry embeddings, and never
/// more than the configured batch size per call.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the collection or index.
    fn name(&self) -> &str;

    /// Whether the index exists on the backend.
    async fn exists(&self) -> anyhow::Result<bool>;

    /// Creates the index for vectors of the given size, using cosine distance.
    async fn create(&self, dimension: u64) -> anyhow::Result<()>;

    /// Writes chunks, replacing any with the same id.
    async fn upsert(&self, chunks: Vec<EmbeddingChunk>) -> anyhow::Result<()>;

    /// Returns up to `top_k` chunks nearest to `vector`, best first.
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<VectorSearchResult>>;

    /// Deletes chunks by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> anyhow::Result<()>;

    /// Every chunk id matching `filter`, in no particular order.
    async fn list_ids(&self, filter: Option<&MetadataFilter>) -> anyhow::Result<Vec<String>>;

    /// Describes the index. `ready` reports whether it accepts traffic.
    async fn describe(&self) -> anyhow::Result<(IndexStats, bool)>;
}

/// Creates the backend selected by the storage mode.
///
/// - `Memory` mode keeps vectors in process; nothing survives a restart
/// - `Grpc` mode connects to a Qdrant server
pub fn create_vector_index(storage_config: &StorageConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let name = storage_config.vector_db.collection_name.clone();
    match &storage_config.storage_mode {
        StorageMode::Memory => Ok(Arc::new(MemoryIndex::new(name))),
        StorageMode::Grpc { url, api_key_env } => {
            let api_key = match api_key_env {
                Some(var) => Some(std::env::var(var).map_err(|_| {
                    anyhow::anyhow!("environment variable {var} for the Qdrant API key is not set")
                })?),
                None => None,
            };
            Ok(Arc::new(QdrantIndex::connect(url, api_key, name)?))
        }
    }
}

/// Durable similarity index over embedded chunks.
///
/// Cheap to clone; clones share the backend and the readiness state.
///
/// # Example
///
/// ```no_run
/// # use advisor_core::rag::{EmbeddingChunk, MetadataFilter, VectorStore};
/// # async fn example(store: VectorStore) -> advisor_core::rag::Result<()> {
/// store
///     .upsert(vec![EmbeddingChunk::new("practice:roi", "Measure benefits early.")
///         .with_metadata("type", "best_practice")])
///     .await?;
///
/// let filter = MetadataFilter::new().eq("type", "best_practice");
/// let hits = store.search("how to track ROI", 5, Some(&filter)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VectorStore {
    index: Arc<dyn VectorIndex>,
    embedder: Embedder,
    upsert_batch_size: usize,
    ready_attempts: u32,
    poll_interval: Duration,
    ready: Arc<OnceCell<()>>,
}

impl VectorStore {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Embedder, storage_config: &StorageConfig) -> Self {
        Self {
            index,
            embedder,
            upsert_batch_size: storage_config.upsert_batch_size.clamp(1, 100),
            ready_attempts: storage_config.ready_attempts.max(1),
            poll_interval: Duration::from_millis(storage_config.ready_poll_interval_ms),
            ready: Arc::new(OnceCell::new()),
        }
    }

    /// Creates the index if it is missing and waits until it is ready.
    ///
    /// Runs once per store; later calls return immediately. Every other
    /// operation calls this first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotReady`] if the index is still not ready
    /// after the configured number of polls.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| self.wait_for_index())
            .await
            .map(|_| ())
    }

    async fn wait_for_index(&self) -> Result<()> {
        if !self.index.exists().await? {
            info!(index = self.index.name(), dimension = self.embedder.dimension(), "Creating vector index");
            self.index.create(self.embedder.dimension() as u64).await?;
        }

        for attempt in 1..=self.ready_attempts {
            let (stats, ready) = self.index.describe().await?;
            if ready {
                debug!(index = self.index.name(), attempt, "Vector index ready");
                return Ok(());
            }
            debug!(index = self.index.name(), attempt, status = %stats.status, "Waiting for vector index");
            tokio::time::sleep(self.poll_interval).await;
        }

        warn!(index = self.index.name(), "Vector index did not become ready");
        Err(RagError::IndexNotReady {
            index: self.index.name().to_string(),
            attempts: self.ready_attempts,
        })
    }

    /// Writes chunks, embedding any that lack a vector first.
    ///
    /// Writes go to the backend in batches of at most 100 and overwrite by id,
    /// so repeating an upsert is a no-op.
    ///
    /// # Returns
    ///
    /// The number of chunks written.
    pub async fn upsert(&self, mut chunks: Vec<EmbeddingChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        self.ensure_ready().await?;

        let missing: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.embedding.is_none())
            .map(|(i, _)| i)
            .collect();

        if !missing.is_empty() {
            let texts: Vec<String> = missing.iter().map(|&i| chunks[i].content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            for (i, vector) in missing.into_iter().zip(vectors) {
                chunks[i].embedding = Some(vector);
            }
        }

        let total = chunks.len();
        let mut remaining = chunks.into_iter().peekable();
        let mut batches = 0;
        while remaining.peek().is_some() {
            let batch: Vec<EmbeddingChunk> = remaining.by_ref().take(self.upsert_batch_size).collect();
            self.index.upsert(batch).await?;
            batches += 1;
        }

        info!(index = self.index.name(), chunks = total, batches, "Upserted chunks");
        Ok(total)
    }

    /// Searches for the chunks most similar to `query`.
    ///
    /// # Arguments
    ///
    /// * `query` - Natural-language query, embedded with the store's model
    /// * `top_k` - Maximum number of results to return
    /// * `filter` - Optional metadata conditions every hit must satisfy
    ///
    /// # Returns
    ///
    /// Results sorted by descending similarity score.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<VectorSearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        self.ensure_ready().await?;

        let vector = self.embedder.embed(query).await?;
        let mut results = self.index.query(vector, top_k, filter).await?;

        for result in &mut results {
            if !result.score.is_finite() {
                result.score = 0.0;
            }
        }
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(index = self.index.name(), top_k, hits = results.len(), "Search complete");
        Ok(results)
    }

    /// Deletes chunks by id. Ids that do not exist are ignored.
    pub async fn delete(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.ensure_ready().await?;

        for batch in ids.chunks(self.upsert_batch_size) {
            self.index.delete(batch).await?;
        }

        info!(index = self.index.name(), deleted = ids.len(), "Deleted chunks");
        Ok(())
    }

    /// Lists the ids of every chunk matching `filter`.
    ///
    /// Unlike [`search`](Self::search) this is not bounded by a top-k, so it
    /// is what deletions should enumerate with.
    pub async fn ids(&self, filter: Option<&MetadataFilter>) -> Result<Vec<String>> {
        self.ensure_ready().await?;
        Ok(self.index.list_ids(filter).await?)
    }

    /// Returns the index dimension, metric and status.
    pub async fn stats(&self) -> Result<IndexStats> {
        self.ensure_ready().await?;
        let (stats, _) = self.index.describe().await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, ScriptedProvider, TEST_DIM};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn store_with(index: Arc<dyn VectorIndex>, provider: Arc<ScriptedProvider>) -> VectorStore {
        let config = test_config();
        let embedder = Embedder::new(provider, config.rag.embedding_model.clone(), 100);
        VectorStore::new(index, embedder, &config.storage)
    }

    fn memory_store() -> (VectorStore, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(TEST_DIM));
        let store = store_with(Arc::new(MemoryIndex::new("test")), provider.clone());
        (store, provider)
    }

    fn chunk(id: &str, content: &str, kind: &str) -> EmbeddingChunk {
        EmbeddingChunk::new(id, content).with_metadata("type", kind)
    }

    /// Index that needs a few polls before it reports ready.
    struct SlowIndex {
        created: AtomicBool,
        polls: AtomicU32,
        ready_after: u32,
    }

    #[async_trait]
    impl VectorIndex for SlowIndex {
        fn name(&self) -> &str {
            "slow"
        }

        async fn exists(&self) -> anyhow::Result<bool> {
            Ok(self.created.load(Ordering::SeqCst))
        }

        async fn create(&self, _dimension: u64) -> anyhow::Result<()> {
            self.created.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert(&self, _chunks: Vec<EmbeddingChunk>) -> anyhow::Result<()> {
            Ok(())
        }

        async fn query(
            &self,
            _vector: Vec<f32>,
            _top_k: usize,
            _filter: Option<&MetadataFilter>,
        ) -> anyhow::Result<Vec<VectorSearchResult>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _ids: &[String]) -> anyhow::Result<()> {
            Ok(())
        }

        async fn list_ids(&self, _filter: Option<&MetadataFilter>) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn describe(&self) -> anyhow::Result<(IndexStats, bool)> {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            let stats = IndexStats {
                index_name: "slow".to_string(),
                dimension: TEST_DIM as u64,
                metric: "cosine".to_string(),
                status: "initializing".to_string(),
                vector_count: None,
            };
            Ok((stats, polls >= self.ready_after))
        }
    }

    #[tokio::test]
    async fn test_upsert_embeds_and_search_ranks() {
        let (store, _) = memory_store();
        store
            .upsert(vec![
                chunk("a", "supply chain planning and inventory optimization", "catalog_product"),
                chunk("b", "payroll and employee onboarding", "catalog_product"),
            ])
            .await
            .unwrap();

        let hits = store.search("inventory and supply chain", 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_upsert_skips_precomputed_embeddings() {
        let (store, provider) = memory_store();
        let precomputed = chunk("a", "already embedded", "x").with_embedding(vec![1.0; TEST_DIM]);
        store
            .upsert(vec![precomputed, chunk("b", "needs an embedding", "x")])
            .await
            .unwrap();

        assert_eq!(provider.embed_calls(), vec![1]);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_id() {
        let (store, _) = memory_store();
        let chunks = vec![chunk("a", "first document", "x"), chunk("b", "second document", "x")];
        store.upsert(chunks.clone()).await.unwrap();
        store.upsert(chunks).await.unwrap();

        assert_eq!(store.stats().await.unwrap().vector_count, Some(2));
    }

    #[tokio::test]
    async fn test_search_applies_filter() {
        let (store, _) = memory_store();
        store
            .upsert(vec![
                chunk("a", "manufacturing planning", "catalog_product"),
                chunk("b", "manufacturing planning", "best_practice"),
            ])
            .await
            .unwrap();

        let filter = MetadataFilter::new().eq("type", "best_practice");
        let hits = store.search("manufacturing", 10, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_ids() {
        let (store, _) = memory_store();
        store.upsert(vec![chunk("a", "document", "x")]).await.unwrap();
        store
            .delete(&["a".to_string(), "never-existed".to_string()])
            .await
            .unwrap();
        assert_eq!(store.stats().await.unwrap().vector_count, Some(0));
    }

    #[tokio::test]
    async fn test_waits_for_new_index() {
        let index = Arc::new(SlowIndex {
            created: AtomicBool::new(false),
            polls: AtomicU32::new(0),
            ready_after: 2,
        });
        let store = store_with(index.clone(), Arc::new(ScriptedProvider::new(TEST_DIM)));

        store.ensure_ready().await.unwrap();
        assert!(index.created.load(Ordering::SeqCst));
        assert_eq!(index.polls.load(Ordering::SeqCst), 2);

        // Readiness is only checked once.
        store.ensure_ready().await.unwrap();
        assert_eq!(index.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_index_never_ready_is_error() {
        let index = Arc::new(SlowIndex {
            created: AtomicBool::new(true),
            polls: AtomicU32::new(0),
            ready_after: u32::MAX,
        });
        let store = store_with(index, Arc::new(ScriptedProvider::new(TEST_DIM)));

        let err = store.search("anything", 3, None).await.unwrap_err();
        assert!(matches!(err, RagError::IndexNotReady { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::unavailable(TEST_DIM));
        let store = store_with(Arc::new(MemoryIndex::new("test")), provider);

        let err = store.search("anything", 3, None).await.unwrap_err();
        assert!(err.is_provider_unavailable());
    }
}
