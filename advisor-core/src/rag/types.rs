use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form chunk metadata, stored alongside the vector.
pub type Metadata = serde_json::Map<String, Value>;

/// A chunk of text stored in the vector database.
///
/// Chunks are the unit of storage in the knowledge base. The `id` is derived
/// from the chunk's source (for example `product:s-4hana:overview`), so
/// ingesting the same source twice overwrites instead of duplicating.
///
/// # Example
///
/// ```no_run
/// # use advisor_core::rag::EmbeddingChunk;
/// let chunk = EmbeddingChunk::new("practice:roi", "Track benefits monthly.")
///     .with_metadata("type", "best_practice")
///     .with_metadata("category", "roi");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingChunk {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl EmbeddingChunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            embedding: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A single hit from a similarity search.
///
/// Returned by vector search operations, ordered by descending score. With
/// cosine similarity over text embeddings the score is effectively in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub id: String,
    pub score: f32,
    pub content: String,
    pub metadata: Metadata,
}

impl VectorSearchResult {
    /// Returns a metadata value as a string slice, if it is one.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// One clause of a [`MetadataFilter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// The field equals `value`, or is a list containing it.
    Equals { key: String, value: Value },
    /// The field equals one of `values`, or is a list sharing one with them.
    AnyOf { key: String, values: Vec<Value> },
}

/// Conjunction of metadata conditions applied to a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Vec<FilterCondition>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(FilterCondition::Equals {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn any_of<V: Into<Value>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(FilterCondition::AnyOf {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against a metadata map.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions.iter().all(|condition| match condition {
            FilterCondition::Equals { key, value } => {
                metadata.get(key).is_some_and(|field| field_contains(field, value))
            }
            FilterCondition::AnyOf { key, values } => metadata
                .get(key)
                .is_some_and(|field| values.iter().any(|v| field_contains(field, v))),
        })
    }
}

fn field_contains(field: &Value, wanted: &Value) -> bool {
    match field {
        Value::Array(items) => items.iter().any(|item| item == wanted),
        other => other == wanted,
    }
}

/// Description of the backing index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub index_name: String,
    pub dimension: u64,
    pub metric: String,
    pub status: String,
    pub vector_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => panic!("metadata must be an object"),
        }
    }

    #[test]
    fn test_filter_equals_scalar_and_list() {
        let meta = metadata(json!({"type": "catalog_product", "industries": ["Retail", "Manufacturing"]}));

        assert!(MetadataFilter::new().eq("type", "catalog_product").matches(&meta));
        assert!(MetadataFilter::new().eq("industries", "Manufacturing").matches(&meta));
        assert!(!MetadataFilter::new().eq("industries", "Healthcare").matches(&meta));
        assert!(!MetadataFilter::new().eq("missing", "x").matches(&meta));
    }

    #[test]
    fn test_filter_any_of() {
        let meta = metadata(json!({"type": "best_practice"}));
        let filter = MetadataFilter::new().any_of("type", ["catalog_product", "best_practice"]);
        assert!(filter.matches(&meta));

        let filter = MetadataFilter::new().any_of("type", ["company_file"]);
        assert!(!filter.matches(&meta));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(MetadataFilter::new().matches(&Metadata::new()));
    }

    #[test]
    fn test_chunk_builder() {
        let chunk = EmbeddingChunk::new("practice:roi", "content")
            .with_metadata("type", "best_practice")
            .with_metadata("deal_count", 3);
        assert_eq!(chunk.metadata.get("deal_count"), Some(&json!(3)));
        assert!(chunk.embedding.is_none());
    }
}
