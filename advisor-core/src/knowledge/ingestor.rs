//! Writes static knowledge and company records into the vector store.

use super::catalog::ProductProfile;
use super::company::{company_chunks, CompanyContext};
use super::source::{load_company, KnowledgeSource};
use super::{KnowledgeError, Result, STATIC_TYPES};
use crate::config::{CompanyIngestConfig, Config};
use crate::rag::{Chunker, EmbeddingChunk, MetadataFilter, VectorStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Counts from one `populate` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateReport {
    pub products: usize,
    pub industries: usize,
    pub best_practices: usize,
    pub chunks: usize,
    pub removed: usize,
}

pub struct KnowledgeIngestor {
    store: VectorStore,
    source: Arc<dyn KnowledgeSource>,
    file_chunker: Chunker,
    limits: CompanyIngestConfig,
    vendor: String,
    populate_lock: Mutex<()>,
}

impl KnowledgeIngestor {
    pub fn new(store: VectorStore, source: Arc<dyn KnowledgeSource>, config: &Config) -> Result<Self> {
        Ok(Self {
            store,
            source,
            file_chunker: Chunker::from_config(&config.rag.file_chunking).map_err(crate::rag::RagError::from)?,
            limits: config.rag.company.clone(),
            vendor: config.generation.vendor_name.clone(),
            populate_lock: Mutex::new(()),
        })
    }

    pub fn source(&self) -> &Arc<dyn KnowledgeSource> {
        &self.source
    }

    /// Rewrites the static knowledge base from the source.
    ///
    /// Products, industry contexts and best practices are upserted in one
    /// call; static chunks that are no longer produced are deleted after.
    ///
    /// # Errors
    ///
    /// [`KnowledgeError::PopulateInProgress`] if another populate is running.
    pub async fn populate(&self) -> Result<PopulateReport> {
        let _guard = self
            .populate_lock
            .try_lock()
            .map_err(|_| KnowledgeError::PopulateInProgress)?;

        let products: Vec<ProductProfile> = self
            .source
            .catalog_products()
            .await
            .map_err(KnowledgeError::Source)?
            .iter()
            .filter(|row| !row.product_name.trim().is_empty())
            .map(ProductProfile::from)
            .collect();
        let industries = self.source.industry_contexts();
        let practices = self.source.best_practices();

        let mut seen = HashSet::new();
        let chunks: Vec<EmbeddingChunk> = products
            .iter()
            .flat_map(|p| p.chunks(&self.vendor))
            .chain(industries.iter().flat_map(|i| i.chunks(&self.vendor)))
            .chain(practices.iter().map(|p| p.chunk()))
            .filter(|chunk| {
                let fresh = seen.insert(chunk.id.clone());
                if !fresh {
                    warn!(id = %chunk.id, "Duplicate knowledge chunk skipped");
                }
                fresh
            })
            .collect();

        let written = self.store.upsert(chunks).await?;

        let filter = MetadataFilter::new().any_of("type", STATIC_TYPES);
        let stale: Vec<String> = self
            .store
            .ids(Some(&filter))
            .await?
            .into_iter()
            .filter(|id| !seen.contains(id))
            .collect();
        if !stale.is_empty() {
            self.store.delete(&stale).await?;
        }

        let report = PopulateReport {
            products: products.len(),
            industries: industries.len(),
            best_practices: practices.len(),
            chunks: written,
            removed: stale.len(),
        };
        info!(
            products = report.products,
            industries = report.industries,
            best_practices = report.best_practices,
            chunks = report.chunks,
            removed = report.removed,
            "Populated knowledge base"
        );
        Ok(report)
    }

    /// Indexes a company read from the source.
    ///
    /// # Returns
    ///
    /// The number of chunks written.
    pub async fn add_company(&self, company_id: &str) -> Result<usize> {
        let company = load_company(self.source.as_ref(), company_id)
            .await
            .map_err(KnowledgeError::Source)?
            .ok_or_else(|| KnowledgeError::CompanyNotFound(company_id.to_string()))?;
        self.add_company_context(company_id, &company).await
    }

    /// Indexes a company record the caller already has.
    pub async fn add_company_context(&self, company_id: &str, company: &CompanyContext) -> Result<usize> {
        let chunks = company_chunks(company_id, company, &self.file_chunker, &self.limits);
        let written = self.store.upsert(chunks).await?;
        info!(company_id, chunks = written, "Added company to knowledge base");
        Ok(written)
    }

    /// Deletes every chunk tagged with the company's id.
    ///
    /// # Returns
    ///
    /// The number of chunks removed.
    pub async fn remove_company(&self, company_id: &str) -> Result<usize> {
        let filter = MetadataFilter::new().eq("company_id", company_id);
        let ids = self.store.ids(Some(&filter)).await?;

        if !ids.is_empty() {
            self.store.delete(&ids).await?;
        }
        info!(company_id, chunks = ids.len(), "Removed company from knowledge base");
        Ok(ids.len())
    }

    /// Re-indexes a company from scratch, dropping chunks for files that
    /// were removed since the last ingest.
    pub async fn update_company(&self, company_id: &str) -> Result<usize> {
        let company = load_company(self.source.as_ref(), company_id)
            .await
            .map_err(KnowledgeError::Source)?
            .ok_or_else(|| KnowledgeError::CompanyNotFound(company_id.to_string()))?;
        self.remove_company(company_id).await?;
        self.add_company_context(company_id, &company).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::source::{Dataset, DatasetSource};
    use crate::rag::{self, MemoryIndex, VectorIndex};
    use crate::test_support::{
        catalog_product as product, sample_company, test_config, ScriptedProvider, TEST_DIM,
    };

    fn ingestor(dataset: Dataset) -> (KnowledgeIngestor, Arc<MemoryIndex>) {
        let config = test_config();
        let index = Arc::new(MemoryIndex::new("test"));
        let provider = Arc::new(ScriptedProvider::new(TEST_DIM));
        let embedder = rag::Embedder::new(provider, config.rag.embedding_model.clone(), 100);
        let store = VectorStore::new(index.clone(), embedder, &config.storage);
        let source = Arc::new(DatasetSource::new(dataset));
        (KnowledgeIngestor::new(store, source, &config).unwrap(), index)
    }

    async fn ids(index: &MemoryIndex) -> Vec<String> {
        let mut ids: Vec<String> = index
            .query(vec![1.0; TEST_DIM], 10_000, None)
            .await
            .unwrap()
            .into_iter()
            .map(|hit| hit.id)
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_populate_is_idempotent() {
        let (ingestor, index) = ingestor(Dataset {
            products: vec![
                product("SAP Ariba", "Procurement", &["Manufacturing"]),
                product("SAP Concur", "Expense Management", &["Retail"]),
            ],
            ..Dataset::default()
        });

        let first = ingestor.populate().await.unwrap();
        // 2 products x 4 + 3 industries x 4 + 3 practices
        assert_eq!(first.chunks, 23);
        let after_first = ids(&index).await;

        let second = ingestor.populate().await.unwrap();
        assert_eq!(second.removed, 0);
        assert_eq!(ids(&index).await, after_first);
        assert!(after_first.contains(&"product:sap-concur:implementation".to_string()));
    }

    #[tokio::test]
    async fn test_populate_prunes_removed_products() {
        let (ingestor, index) = ingestor(Dataset {
            products: vec![product("SAP Ariba", "Procurement", &["Manufacturing"])],
            ..Dataset::default()
        });
        ingestor.populate().await.unwrap();

        // A product left over from an older catalog.
        let stale = ProductProfile::from(&product("SAP Legacy", "ERP", &["Retail"])).chunks("SAP");
        ingestor.store.upsert(stale).await.unwrap();
        assert!(ids(&index).await.contains(&"product:sap-legacy:overview".to_string()));

        let report = ingestor.populate().await.unwrap();
        assert_eq!(report.removed, 4);
        assert!(!ids(&index).await.iter().any(|id| id.contains("sap-legacy")));
    }

    #[tokio::test]
    async fn test_concurrent_populate_rejected() {
        let (ingestor, _) = ingestor(Dataset::default());
        let _held = ingestor.populate_lock.lock().await;
        assert!(matches!(
            ingestor.populate().await,
            Err(KnowledgeError::PopulateInProgress)
        ));
    }

    #[tokio::test]
    async fn test_company_round_trip() {
        let (ingestor, index) = ingestor(Dataset {
            companies: vec![sample_company()],
            ..Dataset::default()
        });
        ingestor.populate().await.unwrap();
        let static_ids = ids(&index).await;

        let added = ingestor.add_company("42").await.unwrap();
        assert_eq!(added, 2);
        // Re-adding overwrites instead of duplicating.
        ingestor.add_company("42").await.unwrap();
        assert_eq!(ids(&index).await.len(), static_ids.len() + 2);

        let removed = ingestor.remove_company("42").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(ids(&index).await, static_ids);
    }

    #[tokio::test]
    async fn test_remove_company_deletes_every_file_chunk() {
        let mut company = sample_company();
        company.uploaded_files = (0..2)
            .map(|n| crate::knowledge::UploadedFile {
                name: format!("rfp-{n}.pdf"),
                category: "RFP".to_string(),
                content: Some("Invoices are matched by hand against purchase orders. ".repeat(60)),
            })
            .collect();
        let (ingestor, index) = ingestor(Dataset {
            companies: vec![company],
            ..Dataset::default()
        });
        ingestor.populate().await.unwrap();
        let static_ids = ids(&index).await;

        // Profile, challenges and five chunks per file.
        let added = ingestor.add_company("42").await.unwrap();
        assert_eq!(added, 12);

        let removed = ingestor.remove_company("42").await.unwrap();
        assert_eq!(removed, added);
        assert_eq!(ids(&index).await, static_ids);
    }

    #[tokio::test]
    async fn test_unknown_company() {
        let (ingestor, _) = ingestor(Dataset::default());
        assert!(matches!(
            ingestor.add_company("missing").await,
            Err(KnowledgeError::CompanyNotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_update_company_drops_old_files() {
        let mut company = sample_company();
        company.uploaded_files = vec![crate::knowledge::UploadedFile {
            name: "old.pdf".to_string(),
            category: "RFP".to_string(),
            content: Some("Purchasing approvals take three weeks on average. ".repeat(4)),
        }];
        let (first, index) = ingestor(Dataset {
            companies: vec![company.clone()],
            ..Dataset::default()
        });
        first.add_company("42").await.unwrap();
        assert!(ids(&index).await.contains(&"company:42:file:0-old-pdf:0".to_string()));

        company.uploaded_files.clear();
        let source = Arc::new(DatasetSource::new(Dataset {
            companies: vec![company],
            ..Dataset::default()
        }));
        let second = KnowledgeIngestor {
            source,
            ..first
        };
        second.update_company("42").await.unwrap();
        let remaining = ids(&index).await;
        assert!(!remaining.iter().any(|id| id.contains(":file:")));
        assert!(remaining.contains(&"company:42:profile".to_string()));
    }
}
