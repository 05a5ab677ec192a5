//! The advisor service: knowledge base plus analysis pipeline.

use crate::analysis::{self, AnalysisError, AnalysisOrchestrator, AnalysisResult};
use crate::config::Config;
use crate::knowledge::{
    self, load_company, CompanyContext, KnowledgeBase, KnowledgeError, KnowledgeSource, KnowledgeStats,
    PopulateReport,
};
use crate::provider::Provider;
use crate::rag::IndexStats;
use std::sync::Arc;
use tracing::info;

/// Generates solution analyses for companies.
///
/// # Example
///
/// ```no_run
/// # use advisor_core::{Advisor, Config, DatasetSource};
/// # use advisor_core::provider::create_provider;
/// # use std::sync::Arc;
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load_or_default();
/// let provider = create_provider(&config.llm)?;
/// let source = Arc::new(DatasetSource::load("dataset.yaml")?);
/// let advisor = Advisor::from_config(&config, provider, source)?;
///
/// advisor.populate().await?;
/// let analysis = advisor.analyze_company("42").await?;
/// println!("{} ({})", analysis.overall_fit, analysis.fit_score);
/// # Ok(())
/// # }
/// ```
pub struct Advisor {
    knowledge: KnowledgeBase,
    orchestrator: AnalysisOrchestrator,
}

impl Advisor {
    pub fn new(knowledge: KnowledgeBase, orchestrator: AnalysisOrchestrator) -> Self {
        Self {
            knowledge,
            orchestrator,
        }
    }

    /// Builds the knowledge base and the orchestrator over one provider.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn Provider>,
        source: Arc<dyn KnowledgeSource>,
    ) -> knowledge::Result<Self> {
        let knowledge = KnowledgeBase::from_config(config, provider.clone(), source)?;
        Ok(Self::new(knowledge, AnalysisOrchestrator::new(provider, config)))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub async fn populate(&self) -> knowledge::Result<PopulateReport> {
        self.knowledge.populate().await
    }

    pub async fn attach(&self) -> knowledge::Result<IndexStats> {
        self.knowledge.attach().await
    }

    /// Indexes a company from the knowledge source. Returns the chunk count.
    pub async fn ingest_company(&self, company_id: &str) -> knowledge::Result<usize> {
        self.knowledge.ingest_company(company_id).await
    }

    pub async fn ingest_company_context(&self, company_id: &str, company: &CompanyContext) -> knowledge::Result<usize> {
        self.knowledge.ingest_company_context(company_id, company).await
    }

    pub async fn update_company(&self, company_id: &str) -> knowledge::Result<usize> {
        self.knowledge.update_company(company_id).await
    }

    /// Deletes a company's chunks. Returns how many were removed.
    pub async fn remove_company(&self, company_id: &str) -> knowledge::Result<usize> {
        self.knowledge.remove_company(company_id).await
    }

    /// Retrieves context for `company` and generates its analysis.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Retrieval`] if the knowledge base is not ready or a
    ///   search fails
    /// - [`AnalysisError::Provider`] / [`AnalysisError::MalformedGeneration`]
    ///   from the generation stages
    pub async fn generate_analysis(&self, company: &CompanyContext) -> analysis::Result<AnalysisResult> {
        info!(company = %company.name, industry = %company.industry, "Generating analysis");
        let bundle = self.knowledge.retrieve(company).await?;
        self.orchestrator.generate(company, &bundle).await
    }

    /// Loads a company from the knowledge source and analyzes it.
    pub async fn analyze_company(&self, company_id: &str) -> analysis::Result<AnalysisResult> {
        let company = load_company(self.knowledge.source().as_ref(), company_id)
            .await
            .map_err(KnowledgeError::Source)?
            .ok_or_else(|| KnowledgeError::CompanyNotFound(company_id.to_string()))?;
        self.generate_analysis(&company).await
    }

    pub async fn stats(&self) -> knowledge::Result<KnowledgeStats> {
        self.knowledge.stats().await
    }
}
