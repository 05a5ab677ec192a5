//! Qdrant vector database storage implementation.
//!
//! Chunk ids are strings like `product:s-4hana:overview`, while Qdrant point
//! ids must be integers or UUIDs. Each chunk id is hashed with SHA-256 into a
//! stable 64-bit point id, and the original id is kept in the payload.

use super::store::VectorIndex;
use super::types::{FilterCondition, IndexStats, Metadata, MetadataFilter, VectorSearchResult};
use super::EmbeddingChunk;
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        vectors_config::Config, CollectionStatus, Condition, CreateCollectionBuilder,
        DeletePointsBuilder, Distance, Filter, PointId, PointStruct, ScrollPointsBuilder,
        SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, VectorsConfig,
    },
    Payload, Qdrant,
};
use serde_json::Value;
use sha2::{Digest, Sha256};

const CONTENT_KEY: &str = "content";
const ID_KEY: &str = "chunk_id";
const SCROLL_PAGE: u32 = 256;

/// Qdrant-backed vector index.
///
/// Upserts replace points with the same id, so re-ingesting a source
/// overwrites its old chunks.
pub struct QdrantIndex {
    client: Qdrant,
    collection_name: String,
}

impl QdrantIndex {
    /// Connects to a Qdrant server over gRPC.
    ///
    /// # Arguments
    ///
    /// * `url` - Server address, e.g. `http://localhost:6334`
    /// * `api_key` - Optional API key for managed deployments
    /// * `collection_name` - Collection holding the knowledge base
    pub fn connect(url: &str, api_key: Option<String>, collection_name: impl Into<String>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .context("Failed to connect to Qdrant server")?;

        Ok(Self {
            client,
            collection_name: collection_name.into(),
        })
    }
}

/// Stable numeric point id for a chunk id.
pub(crate) fn point_id(chunk_id: &str) -> u64 {
    let digest = Sha256::digest(chunk_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn to_payload(chunk: EmbeddingChunk) -> Result<Payload> {
    let mut map = chunk.metadata;
    map.insert(CONTENT_KEY.to_string(), Value::String(chunk.content));
    map.insert(ID_KEY.to_string(), Value::String(chunk.id));
    Payload::try_from(Value::Object(map)).context("Failed to build point payload")
}

fn to_condition(condition: &FilterCondition) -> Option<Condition> {
    match condition {
        FilterCondition::Equals { key, value } => match value {
            Value::String(s) => Some(Condition::matches(key.as_str(), s.clone())),
            Value::Bool(b) => Some(Condition::matches(key.as_str(), *b)),
            Value::Number(n) => n.as_i64().map(|i| Condition::matches(key.as_str(), i)),
            _ => None,
        },
        FilterCondition::AnyOf { key, values } => {
            let keywords: Vec<String> = values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            Some(Condition::matches(key.as_str(), keywords))
        }
    }
}

fn to_filter(filter: &MetadataFilter) -> Filter {
    Filter::must(filter.conditions().iter().filter_map(to_condition))
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn name(&self) -> &str {
        &self.collection_name
    }

    async fn exists(&self) -> Result<bool> {
        self.client
            .collection_exists(&self.collection_name)
            .await
            .context("Failed to check collection")
    }

    async fn create(&self, dimension: u64) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name).vectors_config(VectorsConfig {
                    config: Some(Config::Params(
                        VectorParamsBuilder::new(dimension, Distance::Cosine).build(),
                    )),
                }),
            )
            .await
            .context("Failed to create collection")?;
        Ok(())
    }

    async fn upsert(&self, chunks: Vec<EmbeddingChunk>) -> Result<()> {
        let mut points = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            let embedding = chunk
                .embedding
                .take()
                .with_context(|| format!("chunk {} has no embedding", chunk.id))?;
            let id = point_id(&chunk.id);
            points.push(PointStruct::new(id, embedding, to_payload(chunk)?));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await
            .context("Failed to upsert points")?;
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<VectorSearchResult>> {
        let mut builder =
            SearchPointsBuilder::new(&self.collection_name, vector, top_k as u64).with_payload(true);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            builder = builder.filter(to_filter(filter));
        }

        let response = self
            .client
            .search_points(builder)
            .await
            .context("Failed to search points")?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let mut metadata: Metadata = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect();

                let content = match metadata.remove(CONTENT_KEY) {
                    Some(Value::String(s)) => s,
                    _ => String::new(),
                };
                let id = match metadata.remove(ID_KEY) {
                    Some(Value::String(s)) => s,
                    _ => String::new(),
                };

                VectorSearchResult {
                    id,
                    score: point.score,
                    content,
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let points: Vec<PointId> = ids.iter().map(|id| PointId::from(point_id(id))).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection_name)
                    .points(points)
                    .wait(true),
            )
            .await
            .context("Failed to delete points")?;
        Ok(())
    }

    async fn list_ids(&self, filter: Option<&MetadataFilter>) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(&self.collection_name)
                .limit(SCROLL_PAGE)
                .with_payload(true);
            if let Some(filter) = filter.filter(|f| !f.is_empty()) {
                builder = builder.filter(to_filter(filter));
            }
            if let Some(off) = offset {
                builder = builder.offset(off);
            }

            let page = self
                .client
                .scroll(builder)
                .await
                .context("Failed to scroll points")?;

            ids.extend(
                page.result
                    .iter()
                    .filter_map(|point| point.payload.get(ID_KEY))
                    .filter_map(|value| value.as_str().map(|s| s.to_string())),
            );

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(ids)
    }

    async fn describe(&self) -> Result<(IndexStats, bool)> {
        let info = self
            .client
            .collection_info(&self.collection_name)
            .await
            .context("Failed to get collection info")?
            .result
            .context("Collection info missing from response")?;

        let status = CollectionStatus::try_from(info.status).unwrap_or(CollectionStatus::UnknownCollectionStatus);

        let params = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);
        let (dimension, metric) = match params {
            Some(Config::Params(params)) => (
                params.size,
                Distance::try_from(params.distance)
                    .map(|d| d.as_str_name().to_lowercase())
                    .unwrap_or_else(|_| "unknown".to_string()),
            ),
            _ => (0, "unknown".to_string()),
        };

        let stats = IndexStats {
            index_name: self.collection_name.clone(),
            dimension,
            metric,
            status: status.as_str_name().to_lowercase(),
            vector_count: info.points_count,
        };
        Ok((stats, status == CollectionStatus::Green))
    }
}
