//! Knowledge base: what the advisor knows about the catalog, industries and
//! companies, and how that knowledge is retrieved for an analysis.
//!
//! # Architecture
//!
//! - [`KnowledgeSource`]: read-only access to catalog and company records
//! - [`KnowledgeIngestor`]: turns records into chunks and writes them
//! - [`ContextRetriever`]: runs the per-company context searches
//! - [`KnowledgeBase`]: owns the three and tracks whether the index is usable

mod catalog;
mod company;
mod ingestor;
mod retriever;
pub mod seed;
mod source;

pub use catalog::{BestPractice, CatalogProduct, Complexity, IndustryContext, ProductProfile};
pub use company::{CompanyContext, Deal, PipelineSummary, UploadedFile};
pub use ingestor::{KnowledgeIngestor, PopulateReport};
pub use retriever::{ContextBundle, ContextRetriever, IndustryKnowledge};
pub use source::{load_company, Dataset, DatasetSource, KnowledgeSource};

use crate::config::Config;
use crate::provider::Provider;
use crate::rag::{self, IndexStats, RagError, VectorStore};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

pub(crate) const TYPE_CATALOG_PRODUCT: &str = "catalog_product";
pub(crate) const TYPE_INDUSTRY_CONTEXT: &str = "industry_context";
pub(crate) const TYPE_BEST_PRACTICE: &str = "best_practice";
pub(crate) const TYPE_COMPANY_PROFILE: &str = "company_profile";
pub(crate) const TYPE_COMPANY_FILE: &str = "company_file";

/// Chunk types rewritten by `populate`.
pub(crate) const STATIC_TYPES: [&str; 3] =
    [TYPE_CATALOG_PRODUCT, TYPE_INDUSTRY_CONTEXT, TYPE_BEST_PRACTICE];

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error(transparent)]
    Rag(#[from] RagError),

    #[error("Knowledge source error: {0:#}")]
    Source(anyhow::Error),

    #[error("Company {0} not found")]
    CompanyNotFound(String),

    #[error("Knowledge base population already in progress")]
    PopulateInProgress,

    #[error("Knowledge base is {0}; populate it or attach to a populated index first")]
    NotReady(Lifecycle),
}

impl KnowledgeError {
    /// Whether a backend (embedding provider, vector database or source
    /// store) failed, as opposed to a caller mistake.
    pub fn is_provider_unavailable(&self) -> bool {
        match self {
            KnowledgeError::Rag(err) => err.is_provider_unavailable(),
            KnowledgeError::Source(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Whether the knowledge base can serve retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Empty,
    Populating,
    Ready,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::Empty => "empty",
            Lifecycle::Populating => "populating",
            Lifecycle::Ready => "ready",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub lifecycle: Lifecycle,
    #[serde(flatten)]
    pub index: IndexStats,
}

/// The advisor's knowledge base.
///
/// Starts `Empty`; [`populate`](Self::populate) or [`attach`](Self::attach)
/// moves it to `Ready`. Retrieval before that is an error. Company ingestion
/// works in any state.
///
/// # Example
///
/// ```no_run
/// # use advisor_core::{Config, DatasetSource, KnowledgeBase};
/// # use advisor_core::provider::OllamaProvider;
/// # use std::sync::Arc;
/// # async fn example() -> advisor_core::knowledge::Result<()> {
/// let config = Config::default();
/// let provider = Arc::new(OllamaProvider::default());
/// let source = Arc::new(DatasetSource::default());
/// let kb = KnowledgeBase::from_config(&config, provider, source)?;
///
/// kb.populate().await?;
/// kb.ingest_company("42").await?;
/// # Ok(())
/// # }
/// ```
pub struct KnowledgeBase {
    store: VectorStore,
    ingestor: KnowledgeIngestor,
    retriever: ContextRetriever,
    lifecycle: RwLock<Lifecycle>,
}

impl KnowledgeBase {
    pub fn new(store: VectorStore, source: Arc<dyn KnowledgeSource>, config: &Config) -> Result<Self> {
        Ok(Self {
            ingestor: KnowledgeIngestor::new(store.clone(), source, config)?,
            retriever: ContextRetriever::new(
                store.clone(),
                config.retrieval.clone(),
                config.generation.vendor_name.clone(),
            ),
            store,
            lifecycle: RwLock::new(Lifecycle::Empty),
        })
    }

    /// Builds the configured vector store and a knowledge base on top of it.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn Provider>,
        source: Arc<dyn KnowledgeSource>,
    ) -> Result<Self> {
        let store = rag::build_vector_store(config, provider)?;
        Self::new(store, source, config)
    }

    pub fn source(&self) -> &Arc<dyn KnowledgeSource> {
        self.ingestor.source()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read().await
    }

    /// Rewrites the static knowledge and marks the knowledge base ready.
    ///
    /// A knowledge base that was already ready keeps serving retrieval while
    /// it is repopulated.
    pub async fn populate(&self) -> Result<PopulateReport> {
        let previous = {
            let mut lifecycle = self.lifecycle.write().await;
            let previous = *lifecycle;
            if previous == Lifecycle::Empty {
                *lifecycle = Lifecycle::Populating;
            }
            previous
        };

        match self.ingestor.populate().await {
            Ok(report) => {
                *self.lifecycle.write().await = Lifecycle::Ready;
                Ok(report)
            }
            Err(KnowledgeError::PopulateInProgress) => Err(KnowledgeError::PopulateInProgress),
            Err(err) => {
                *self.lifecycle.write().await = previous;
                Err(err)
            }
        }
    }

    /// Marks the knowledge base ready if the index already holds chunks,
    /// e.g. from an earlier run against the same Qdrant collection.
    pub async fn attach(&self) -> Result<IndexStats> {
        let stats = self.store.stats().await?;
        if stats.vector_count.unwrap_or(0) == 0 {
            return Err(KnowledgeError::NotReady(self.lifecycle().await));
        }

        let mut lifecycle = self.lifecycle.write().await;
        if *lifecycle == Lifecycle::Empty {
            *lifecycle = Lifecycle::Ready;
            info!(index = %stats.index_name, vectors = ?stats.vector_count, "Attached to existing knowledge base");
        }
        Ok(stats)
    }

    pub async fn ingest_company(&self, company_id: &str) -> Result<usize> {
        self.ingestor.add_company(company_id).await
    }

    pub async fn ingest_company_context(&self, company_id: &str, company: &CompanyContext) -> Result<usize> {
        self.ingestor.add_company_context(company_id, company).await
    }

    pub async fn update_company(&self, company_id: &str) -> Result<usize> {
        self.ingestor.update_company(company_id).await
    }

    pub async fn remove_company(&self, company_id: &str) -> Result<usize> {
        self.ingestor.remove_company(company_id).await
    }

    /// Retrieves the analysis context for `company`.
    ///
    /// # Errors
    ///
    /// [`KnowledgeError::NotReady`] unless the knowledge base is `Ready`.
    pub async fn retrieve(&self, company: &CompanyContext) -> Result<ContextBundle> {
        self.ensure_ready().await?;
        Ok(self.retriever.retrieve(company).await?)
    }

    /// Lists the catalog products and industry insights indexed for an
    /// industry.
    pub async fn industry_knowledge(&self, industry: &str) -> Result<IndustryKnowledge> {
        self.ensure_ready().await?;
        Ok(self.retriever.industry_knowledge(industry, 10).await?)
    }

    pub async fn stats(&self) -> Result<KnowledgeStats> {
        Ok(KnowledgeStats {
            lifecycle: self.lifecycle().await,
            index: self.store.stats().await?,
        })
    }

    async fn ensure_ready(&self) -> Result<()> {
        match self.lifecycle().await {
            Lifecycle::Ready => Ok(()),
            other => Err(KnowledgeError::NotReady(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        catalog_product, memory_knowledge_base, sample_company, test_config, unavailable_knowledge_base,
    };

    fn dataset() -> Dataset {
        Dataset {
            products: vec![catalog_product("SAP Ariba", "Procurement", &["Manufacturing"])],
            companies: vec![sample_company()],
            ..Dataset::default()
        }
    }

    #[tokio::test]
    async fn test_retrieve_requires_ready() {
        let (kb, _) = memory_knowledge_base(dataset());
        assert_eq!(kb.lifecycle().await, Lifecycle::Empty);

        let err = kb.retrieve(&sample_company()).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::NotReady(Lifecycle::Empty)));
        assert!(!err.is_provider_unavailable());

        // Ingesting a company does not make the catalog available.
        kb.ingest_company("42").await.unwrap();
        assert_eq!(kb.lifecycle().await, Lifecycle::Empty);

        kb.populate().await.unwrap();
        assert_eq!(kb.lifecycle().await, Lifecycle::Ready);
        assert!(kb.retrieve(&sample_company()).await.is_ok());
    }

    #[tokio::test]
    async fn test_attach() {
        let (kb, store) = memory_knowledge_base(dataset());
        assert!(matches!(kb.attach().await, Err(KnowledgeError::NotReady(_))));

        // Another process populated the same index.
        let source = Arc::new(DatasetSource::new(dataset()));
        let other = KnowledgeBase::new(store, source, &test_config()).unwrap();
        other.populate().await.unwrap();

        let stats = kb.attach().await.unwrap();
        assert_eq!(stats.vector_count, Some(19));
        assert_eq!(kb.lifecycle().await, Lifecycle::Ready);
    }

    #[tokio::test]
    async fn test_failed_populate_restores_lifecycle() {
        let (kb, _) = unavailable_knowledge_base();
        let err = kb.populate().await.unwrap_err();
        assert!(err.is_provider_unavailable());
        assert_eq!(kb.lifecycle().await, Lifecycle::Empty);
    }

    #[tokio::test]
    async fn test_stats() {
        let (kb, _) = memory_knowledge_base(dataset());
        kb.populate().await.unwrap();
        let stats = kb.stats().await.unwrap();
        assert_eq!(stats.lifecycle, Lifecycle::Ready);
        assert_eq!(stats.index.metric, "cosine");

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["lifecycle"], "ready");
        assert_eq!(json["indexName"], "test");
    }
}
