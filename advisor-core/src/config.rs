use crate::models::EmbeddingModel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the whole advisor pipeline.
///
/// Every section has defaults, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub rag: RagConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Which backend serves completions and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible HTTP API.
    OpenAi,
    /// A local Ollama daemon.
    Ollama,
}

/// Configuration for the text-generation model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key. Ollama ignores it.
    pub api_key_env: String,
    pub temperature: f64,
}

/// Token limits and validation floors for the three generation stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Vendor whose catalog is being pitched, used in prompt wording.
    pub vendor_name: String,
    pub solutions_max_tokens: u32,
    pub challenges_max_tokens: u32,
    pub narrative_max_tokens: u32,
    /// Minimum length of each business challenge after normalization.
    pub challenge_min_chars: usize,
    pub narrative_min_chars: NarrativeMinimums,
    /// Narrative strings shorter than this are left unformatted.
    pub format_min_chars: usize,
}

/// Minimum lengths for the stage-three narrative sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeMinimums {
    pub company_profile: usize,
    pub business_context: usize,
    pub methodology: usize,
}

/// Configuration for chunking and embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub embedding_model: EmbeddingModel,
    /// Texts sent to the embedding provider per request.
    pub embed_batch_size: usize,
    /// Chunking for uploaded company files.
    pub file_chunking: ChunkingConfig,
    pub company: CompanyIngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Fraction of the window after which a sentence break may end a chunk.
    pub boundary_ratio: f32,
    /// Trimmed chunks shorter than this are dropped.
    pub min_chunk_chars: usize,
}

/// Caps on per-company ingestion. Uploaded content past these limits is not
/// indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyIngestConfig {
    pub max_files: usize,
    pub max_chunks_per_file: usize,
    pub min_file_chars: usize,
    pub min_challenge_chars: usize,
}

/// Result counts for each of the retriever's searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub product_top_k: usize,
    /// Distinct products kept in the bundle (3 to 6).
    pub product_cap: usize,
    pub insight_top_k: usize,
    pub guidance_products: usize,
    pub guidance_top_k: usize,
    pub similar_company_top_k: usize,
    pub file_top_k: usize,
}

/// Vector database storage mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StorageMode {
    /// In-process index; contents are lost on exit (default)
    Memory,
    /// gRPC storage - connect to an external Qdrant server
    Grpc {
        url: String,
        #[serde(default)]
        api_key_env: Option<String>,
    },
}

impl Default for StorageMode {
    fn default() -> Self {
        Self::Memory
    }
}

/// Storage configuration for the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub storage_mode: StorageMode,
    pub vector_db: VectorDbConfig,
    /// Points written per backend call.
    pub upsert_batch_size: usize,
    /// Readiness polls after creating a missing index.
    pub ready_attempts: u32,
    pub ready_poll_interval_ms: u64,
}

/// Vector database configuration (collection/index name, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Collection/index name for storing vectors
    pub collection_name: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.2,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            vendor_name: "SAP".to_string(),
            solutions_max_tokens: 15_000,
            challenges_max_tokens: 2_000,
            narrative_max_tokens: 6_000,
            challenge_min_chars: 80,
            narrative_min_chars: NarrativeMinimums::default(),
            format_min_chars: 200,
        }
    }
}

impl Default for NarrativeMinimums {
    fn default() -> Self {
        Self {
            company_profile: 400,
            business_context: 400,
            methodology: 600,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: EmbeddingModel::default(),
            embed_batch_size: 100,
            file_chunking: ChunkingConfig::files(),
            company: CompanyIngestConfig::default(),
        }
    }
}

impl ChunkingConfig {
    pub fn files() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            boundary_ratio: 0.6,
            min_chunk_chars: 30,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::files()
    }
}

impl Default for CompanyIngestConfig {
    fn default() -> Self {
        Self {
            max_files: 2,
            max_chunks_per_file: 5,
            min_file_chars: 100,
            min_challenge_chars: 20,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            product_top_k: 10,
            product_cap: 6,
            insight_top_k: 8,
            guidance_products: 3,
            guidance_top_k: 5,
            similar_company_top_k: 5,
            file_top_k: 3,
        }
    }
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            collection_name: "advisor_kb".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            vector_db: VectorDbConfig::default(),
            upsert_batch_size: 100,
            ready_attempts: 30,
            ready_poll_interval_ms: 2_000,
        }
    }
}

/// Where the advisor daemon listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/advisor.sock"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("config.yaml").unwrap_or_default()
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.rag.file_chunking;
        if chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid("rag.file_chunking.chunk_size must be > 0".to_string()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(ConfigError::Invalid(
                "rag.file_chunking.chunk_overlap must be smaller than chunk_size".to_string(),
            ));
        }

        if !(3..=6).contains(&self.retrieval.product_cap) {
            return Err(ConfigError::Invalid(
                "retrieval.product_cap must be between 3 and 6".to_string(),
            ));
        }

        if self.storage.upsert_batch_size == 0 || self.storage.upsert_batch_size > 100 {
            return Err(ConfigError::Invalid(
                "storage.upsert_batch_size must be between 1 and 100".to_string(),
            ));
        }

        if self.rag.embed_batch_size == 0 {
            return Err(ConfigError::Invalid("rag.embed_batch_size must be > 0".to_string()));
        }

        Ok(())
    }
}
