//! Read-only access to the relational data the knowledge base is built from.

use super::catalog::{BestPractice, CatalogProduct, IndustryContext};
use super::company::{CompanyContext, Deal, UploadedFile};
use super::seed;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where catalog products and company records come from.
///
/// Implementations only read. Industry contexts and best practices default
/// to the built-in seed knowledge.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Every product in the vendor catalog.
    async fn catalog_products(&self) -> Result<Vec<CatalogProduct>>;

    /// The company profile, without files or deals. `None` if unknown.
    async fn company(&self, company_id: &str) -> Result<Option<CompanyContext>>;

    /// Files uploaded for the company whose text was extracted.
    async fn company_files(&self, company_id: &str) -> Result<Vec<UploadedFile>>;

    async fn company_deals(&self, company_id: &str) -> Result<Vec<Deal>>;

    fn industry_contexts(&self) -> Vec<IndustryContext> {
        seed::industry_contexts()
    }

    fn best_practices(&self) -> Vec<BestPractice> {
        seed::best_practices()
    }
}

/// Loads a company together with its files and deals.
pub async fn load_company(
    source: &dyn KnowledgeSource,
    company_id: &str,
) -> Result<Option<CompanyContext>> {
    let Some(mut company) = source.company(company_id).await? else {
        return Ok(None);
    };
    company.id = Some(company_id.to_string());
    company.uploaded_files = source.company_files(company_id).await?;
    company.deals = source.company_deals(company_id).await?;
    Ok(Some(company))
}

/// On-disk dataset: the catalog plus company records with their files and
/// deals inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
    #[serde(default)]
    pub companies: Vec<CompanyContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries: Option<Vec<IndustryContext>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_practices: Option<Vec<BestPractice>>,
}

/// [`KnowledgeSource`] backed by a YAML or JSON dataset file.
///
/// # Example
///
/// ```no_run
/// # use advisor_core::DatasetSource;
/// # fn example() -> anyhow::Result<()> {
/// let source = DatasetSource::load("dataset.yaml")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatasetSource {
    dataset: Dataset,
}

impl DatasetSource {
    /// Reads a dataset file. JSON files parse too, since YAML is a superset.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let dataset: Dataset = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
        Ok(Self::new(dataset))
    }

    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    fn find(&self, company_id: &str) -> Option<&CompanyContext> {
        self.dataset
            .companies
            .iter()
            .find(|c| c.id.as_deref() == Some(company_id))
    }
}

#[async_trait]
impl KnowledgeSource for DatasetSource {
    async fn catalog_products(&self) -> Result<Vec<CatalogProduct>> {
        Ok(self.dataset.products.clone())
    }

    async fn company(&self, company_id: &str) -> Result<Option<CompanyContext>> {
        Ok(self.find(company_id).map(|c| CompanyContext {
            uploaded_files: Vec::new(),
            deals: Vec::new(),
            ..c.clone()
        }))
    }

    async fn company_files(&self, company_id: &str) -> Result<Vec<UploadedFile>> {
        Ok(self
            .find(company_id)
            .map(|c| {
                c.uploaded_files
                    .iter()
                    .filter(|f| f.extracted_text().is_some())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn company_deals(&self, company_id: &str) -> Result<Vec<Deal>> {
        Ok(self.find(company_id).map(|c| c.deals.clone()).unwrap_or_default())
    }

    fn industry_contexts(&self) -> Vec<IndustryContext> {
        self.dataset
            .industries
            .clone()
            .unwrap_or_else(seed::industry_contexts)
    }

    fn best_practices(&self) -> Vec<BestPractice> {
        self.dataset
            .best_practices
            .clone()
            .unwrap_or_else(seed::best_practices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DATASET: &str = r#"
products:
  - product_name: SAP Ariba
    description: Cloud procurement suite
    category: Procurement
    target_industries: [Manufacturing]
    implementation_months_min: 6
    implementation_months_max: 9
companies:
  - id: "7"
    name: Globex
    industry: Manufacturing
    size: Enterprise (5000+ employees)
    region: EMEA
    uploadedFiles:
      - name: rfp.pdf
        category: RFP
        content: Globex wants to replace its purchasing spreadsheets.
      - name: scan.png
        category: Image
    deals:
      - name: Procurement rollout
        value: 250000
        stage: Proposal
        probability: 0.5
"#;

    fn dataset_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_yaml_dataset() {
        let file = dataset_file(DATASET);
        let source = DatasetSource::load(file.path()).unwrap();

        let products = source.catalog_products().await.unwrap();
        assert_eq!(products[0].product_name, "SAP Ariba");
        assert_eq!(products[0].implementation_months_max, Some(9));

        let company = load_company(&source, "7").await.unwrap().unwrap();
        assert_eq!(company.id.as_deref(), Some("7"));
        assert_eq!(company.uploaded_files.len(), 1);
        assert_eq!(company.deals[0].value, 250_000.0);

        assert!(load_company(&source, "8").await.unwrap().is_none());
        assert_eq!(source.industry_contexts().len(), 3);
    }

    #[tokio::test]
    async fn test_load_json_dataset() {
        let file = dataset_file(
            r#"{"products": [{"product_name": "SAP Concur", "category": "Expense Management"}],
                "best_practices": [{"category": "roi", "title": "ROI", "content": "Measure it."}]}"#,
        );
        let source = DatasetSource::load(file.path()).unwrap();
        assert_eq!(source.catalog_products().await.unwrap().len(), 1);
        assert_eq!(source.best_practices().len(), 1);
        assert!(source.company("1").await.unwrap().is_none());
    }

    #[test]
    fn test_missing_dataset_file() {
        let err = DatasetSource::load("/nonexistent/dataset.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset"));
    }

    #[tokio::test]
    async fn test_demo_dataset_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/dataset.yaml");
        let source = DatasetSource::load(path).unwrap();
        assert_eq!(source.catalog_products().await.unwrap().len(), 5);

        let acme = load_company(&source, "42").await.unwrap().unwrap();
        assert_eq!(acme.name, "Acme Manufacturing");
        assert_eq!(acme.uploaded_files.len(), 1);
        assert_eq!(acme.deals.len(), 2);
    }
}
