//! In-process vector index.
//!
//! Brute-force cosine search over a hash map. Meant for local runs, demos and
//! tests; contents disappear with the process.

use super::store::VectorIndex;
use super::types::{EmbeddingChunk, IndexStats, MetadataFilter, VectorSearchResult};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    dimension: Option<u64>,
    points: HashMap<String, EmbeddingChunk>,
}

/// Vector index held entirely in memory.
pub struct MemoryIndex {
    name: String,
    state: RwLock<MemoryState>,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.state.read().await.dimension.is_some())
    }

    async fn create(&self, dimension: u64) -> Result<()> {
        self.state.write().await.dimension = Some(dimension);
        Ok(())
    }

    async fn upsert(&self, chunks: Vec<EmbeddingChunk>) -> Result<()> {
        let mut state = self.state.write().await;
        let dimension = state.dimension.context("memory index has not been created")?;

        for chunk in chunks {
            let len = chunk.embedding.as_ref().map(Vec::len).unwrap_or(0);
            if len as u64 != dimension {
                bail!("chunk {} has {} dimensions, index expects {}", chunk.id, len, dimension);
            }
            state.points.insert(chunk.id.clone(), chunk);
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<VectorSearchResult>> {
        let state = self.state.read().await;

        let mut results: Vec<VectorSearchResult> = state
            .points
            .values()
            .filter(|chunk| filter.map_or(true, |f| f.matches(&chunk.metadata)))
            .filter_map(|chunk| {
                let embedding = chunk.embedding.as_ref()?;
                Some(VectorSearchResult {
                    id: chunk.id.clone(),
                    score: cosine_similarity(&vector, embedding),
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                })
            })
            .collect();

        // Ties broken by id so results are stable across runs.
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut state = self.state.write().await;
        for id in ids {
            state.points.remove(id);
        }
        Ok(())
    }

    async fn list_ids(&self, filter: Option<&MetadataFilter>) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .points
            .values()
            .filter(|chunk| filter.map_or(true, |f| f.matches(&chunk.metadata)))
            .map(|chunk| chunk.id.clone())
            .collect())
    }

    async fn describe(&self) -> Result<(IndexStats, bool)> {
        let state = self.state.read().await;
        let stats = IndexStats {
            index_name: self.name.clone(),
            dimension: state.dimension.unwrap_or(0),
            metric: "cosine".to_string(),
            status: if state.dimension.is_some() { "ready" } else { "missing" }.to_string(),
            vector_count: Some(state.points.len() as u64),
        };
        Ok((stats, state.dimension.is_some()))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_before_create_fails() {
        let index = MemoryIndex::new("test");
        let chunk = EmbeddingChunk::new("a", "text").with_embedding(vec![1.0, 0.0]);
        assert!(index.upsert(vec![chunk]).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_dimension_rejected() {
        let index = MemoryIndex::new("test");
        index.create(3).await.unwrap();
        let chunk = EmbeddingChunk::new("a", "text").with_embedding(vec![1.0, 0.0]);
        assert!(index.upsert(vec![chunk]).await.is_err());
    }

    #[tokio::test]
    async fn test_list_ids_applies_filter() {
        let index = MemoryIndex::new("test");
        index.create(2).await.unwrap();
        let chunks = (0..50).map(|n| {
            EmbeddingChunk::new(format!("c{n}"), "text")
                .with_metadata("company_id", if n % 2 == 0 { "42" } else { "7" })
                .with_embedding(vec![1.0, n as f32])
        });
        index.upsert(chunks.collect()).await.unwrap();

        assert_eq!(index.list_ids(None).await.unwrap().len(), 50);
        let filter = MetadataFilter::new().eq("company_id", "42");
        let mut ids = index.list_ids(Some(&filter)).await.unwrap();
        ids.sort();
        assert_eq!(ids.len(), 25);
        assert!(ids.iter().all(|id| id[1..].parse::<u32>().unwrap() % 2 == 0));
    }

    #[tokio::test]
    async fn test_query_orders_and_truncates() {
        let index = MemoryIndex::new("test");
        index.create(2).await.unwrap();
        index
            .upsert(vec![
                EmbeddingChunk::new("near", "a").with_embedding(vec![1.0, 0.1]),
                EmbeddingChunk::new("far", "b").with_embedding(vec![0.0, 1.0]),
                EmbeddingChunk::new("mid", "c").with_embedding(vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = index.query(vec![1.0, 0.0], 2, None).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }
}
