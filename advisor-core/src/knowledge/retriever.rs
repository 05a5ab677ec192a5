//! Assembles the retrieval context for one company.

use super::company::CompanyContext;
use super::seed;
use super::{
    TYPE_BEST_PRACTICE, TYPE_CATALOG_PRODUCT, TYPE_COMPANY_FILE, TYPE_COMPANY_PROFILE,
    TYPE_INDUSTRY_CONTEXT,
};
use crate::config::RetrievalConfig;
use crate::rag::{MetadataFilter, Result, VectorSearchResult, VectorStore};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Everything retrieved for one company, grouped by purpose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBundle {
    /// One hit per distinct catalog product, best first.
    pub relevant_products: Vec<VectorSearchResult>,
    pub industry_insights: Vec<VectorSearchResult>,
    pub implementation_guidance: Vec<VectorSearchResult>,
    /// The company's own profile first (when indexed), then similar ones.
    pub company_profiles: Vec<VectorSearchResult>,
    pub relevant_files: Vec<VectorSearchResult>,
    /// Text of the company's own uploaded files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
}

impl ContextBundle {
    /// Names of the retrieved catalog products, in rank order.
    pub fn product_names(&self) -> Vec<&str> {
        self.relevant_products
            .iter()
            .filter_map(|hit| hit.meta_str("product_name"))
            .collect()
    }
}

/// Catalog and industry chunks indexed for one industry.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryKnowledge {
    pub products: Vec<VectorSearchResult>,
    pub insights: Vec<VectorSearchResult>,
}

pub struct ContextRetriever {
    store: VectorStore,
    config: RetrievalConfig,
    vendor: String,
}

impl ContextRetriever {
    pub fn new(store: VectorStore, config: RetrievalConfig, vendor: impl Into<String>) -> Self {
        Self {
            store,
            config,
            vendor: vendor.into(),
        }
    }

    /// Runs the five context searches for `company`.
    ///
    /// Products are searched first since implementation guidance is keyed on
    /// the top products; the remaining searches run concurrently. Finding no
    /// products is not an error.
    pub async fn retrieve(&self, company: &CompanyContext) -> Result<ContextBundle> {
        let relevant_products = self.products(company).await?;

        let (industry_insights, implementation_guidance, company_profiles, relevant_files) = futures::try_join!(
            self.industry_insights(&company.industry, self.config.insight_top_k),
            self.implementation_guidance(&relevant_products),
            self.company_profiles(company),
            self.relevant_files(company),
        )?;

        let bundle = ContextBundle {
            relevant_products,
            industry_insights,
            implementation_guidance,
            company_profiles,
            relevant_files,
            file_content: uploaded_file_content(company),
        };

        info!(
            company = %company.name,
            products = bundle.relevant_products.len(),
            insights = bundle.industry_insights.len(),
            guidance = bundle.implementation_guidance.len(),
            company_profiles = bundle.company_profiles.len(),
            files = bundle.relevant_files.len(),
            has_file_content = bundle.file_content.is_some(),
            "Retrieved context"
        );
        Ok(bundle)
    }

    /// Lists what the knowledge base holds for an industry.
    pub async fn industry_knowledge(&self, industry: &str, top_k: usize) -> Result<IndustryKnowledge> {
        let query = format!("{} solutions for {industry}", self.vendor);
        let filter = self.product_filter(industry);
        let (products, insights) = futures::try_join!(
            self.store.search(&query, top_k, Some(&filter)),
            self.industry_insights(industry, top_k),
        )?;
        Ok(IndustryKnowledge { products, insights })
    }

    fn product_filter(&self, industry: &str) -> MetadataFilter {
        let filter = MetadataFilter::new().eq("type", TYPE_CATALOG_PRODUCT);
        if industry.trim().is_empty() {
            filter
        } else {
            filter.eq("industries", industry)
        }
    }

    async fn products(&self, company: &CompanyContext) -> Result<Vec<VectorSearchResult>> {
        let challenges = match company.stated_challenges() {
            Some(stated) => stated.to_string(),
            None => seed::default_challenges(&company.industry).join(", "),
        };
        let query = format!(
            "{} solutions for {} industry addressing {challenges}",
            self.vendor, company.industry
        );

        let hits = self
            .store
            .search(&query, self.config.product_top_k, Some(&self.product_filter(&company.industry)))
            .await?;
        let found = hits.len();

        let cap = self.config.product_cap.clamp(3, 6);
        let mut seen = HashSet::new();
        let products: Vec<VectorSearchResult> = hits
            .into_iter()
            .filter(|hit| match hit.meta_str("product_name") {
                Some(name) => seen.insert(name.to_lowercase()),
                None => false,
            })
            .take(cap)
            .collect();

        debug!(hits = found, products = products.len(), cap, "Product search");
        Ok(products)
    }

    async fn industry_insights(&self, industry: &str, top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let mut filter = MetadataFilter::new().eq("type", TYPE_INDUSTRY_CONTEXT);
        if !industry.trim().is_empty() {
            filter = filter.eq("industry", industry);
        }
        self.store
            .search(
                &format!("industry trends challenges best practices {industry}"),
                top_k,
                Some(&filter),
            )
            .await
    }

    async fn implementation_guidance(
        &self,
        products: &[VectorSearchResult],
    ) -> Result<Vec<VectorSearchResult>> {
        let filter = MetadataFilter::new().eq("type", TYPE_BEST_PRACTICE);
        let searches = products
            .iter()
            .filter_map(|hit| hit.meta_str("product_name"))
            .take(self.config.guidance_products)
            .map(|name| {
                let query = format!("implementation best practices {name} {}", self.vendor);
                let filter = filter.clone();
                async move {
                    self.store
                        .search(&query, self.config.guidance_top_k, Some(&filter))
                        .await
                }
            });

        let mut seen = HashSet::new();
        Ok(try_join_all(searches)
            .await?
            .into_iter()
            .flatten()
            .filter(|hit| seen.insert(hit.id.clone()))
            .collect())
    }

    async fn company_profiles(&self, company: &CompanyContext) -> Result<Vec<VectorSearchResult>> {
        let mut profiles = Vec::new();

        if let Some(id) = company.id.as_deref() {
            let own = MetadataFilter::new()
                .eq("company_id", id)
                .eq("section", "profile");
            profiles = self
                .store
                .search(
                    &format!("company profile {} {}", company.name, company.industry),
                    1,
                    Some(&own),
                )
                .await?;
        }

        let mut filter = MetadataFilter::new().eq("type", TYPE_COMPANY_PROFILE);
        if !company.industry.trim().is_empty() {
            filter = filter.eq("industry", company.industry.as_str());
        }
        let query = format!(
            "Company profile: {} industry, {} company, {}",
            company.industry,
            company.size,
            company.stated_challenges().unwrap_or("business challenges"),
        );
        let similar = self
            .store
            .search(&query, self.config.similar_company_top_k, Some(&filter))
            .await?;

        let mut seen: HashSet<String> = profiles.iter().map(|p| p.id.clone()).collect();
        profiles.extend(similar.into_iter().filter(|hit| seen.insert(hit.id.clone())));
        Ok(profiles)
    }

    async fn relevant_files(&self, company: &CompanyContext) -> Result<Vec<VectorSearchResult>> {
        let query = format!(
            "File content related to {} industry, {}",
            company.industry,
            company.stated_challenges().unwrap_or("business challenges"),
        );
        let filter = MetadataFilter::new().eq("type", TYPE_COMPANY_FILE);
        self.store
            .search(&query, self.config.file_top_k, Some(&filter))
            .await
    }
}

/// The company's own uploaded text, passed to prompts verbatim.
fn uploaded_file_content(company: &CompanyContext) -> Option<String> {
    let sections: Vec<String> = company
        .uploaded_files
        .iter()
        .filter_map(|file| {
            file.extracted_text()
                .map(|text| format!("File: {} ({})\n{text}", file.name, file.category))
        })
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n---\n\n"))
    }
}
