//! Company records and the chunks they are stored as.

use super::{TYPE_COMPANY_FILE, TYPE_COMPANY_PROFILE};
use crate::config::CompanyIngestConfig;
use crate::rag::{Chunker, EmbeddingChunk};
use crate::text::{format_usd, or_default, slugify};
use serde::{Deserialize, Serialize};

/// Everything known about the company being analyzed.
///
/// Snake-case aliases accept rows exported straight from the relational
/// store (`company_size`, `business_challenges`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default, alias = "company_size")]
    pub size: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, alias = "business_challenges", skip_serializing_if = "Option::is_none")]
    pub challenges: Option<String>,
    #[serde(default, alias = "current_systems", skip_serializing_if = "Option::is_none")]
    pub current_systems: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, alias = "uploaded_files", skip_serializing_if = "Vec::is_empty")]
    pub uploaded_files: Vec<UploadedFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deals: Vec<Deal>,
}

impl CompanyContext {
    /// The company's stated challenges, if they are more than whitespace.
    pub fn stated_challenges(&self) -> Option<&str> {
        self.challenges.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn pipeline(&self) -> Option<PipelineSummary> {
        PipelineSummary::from_deals(&self.deals)
    }
}

/// A document uploaded for a company, with its extracted text if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(alias = "original_name")]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "file_content", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UploadedFile {
    pub fn extracted_text(&self) -> Option<&str> {
        self.content.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(alias = "deal_name")]
    pub name: String,
    #[serde(default, alias = "deal_value")]
    pub value: f64,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub probability: f64,
}

/// Aggregate view of a company's deals.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub deal_count: usize,
    pub total_value: f64,
    pub average_value: f64,
    pub stages: Vec<String>,
}

impl PipelineSummary {
    pub fn from_deals(deals: &[Deal]) -> Option<Self> {
        if deals.is_empty() {
            return None;
        }
        let total_value: f64 = deals.iter().map(|d| d.value).filter(|v| v.is_finite()).sum();
        Some(Self {
            deal_count: deals.len(),
            total_value,
            average_value: total_value / deals.len() as f64,
            stages: deals.iter().map(|d| d.stage.clone()).collect(),
        })
    }
}

/// Builds a company's chunks: profile, challenges, file excerpts, pipeline.
pub(crate) fn company_chunks(
    company_id: &str,
    company: &CompanyContext,
    file_chunker: &Chunker,
    limits: &CompanyIngestConfig,
) -> Vec<EmbeddingChunk> {
    let tag = |chunk: EmbeddingChunk| {
        chunk
            .with_metadata("company_id", company_id)
            .with_metadata("company_name", company.name.clone())
            .with_metadata("industry", company.industry.clone())
    };

    let mut chunks = Vec::new();

    let profile = format!(
        "Company: {} | Industry: {} | Size: {} | Region: {} | Challenges: {} | Systems: {} | Budget: {} | Timeline: {}",
        company.name,
        company.industry,
        company.size,
        company.region,
        or_default(company.challenges.as_deref(), "Not specified"),
        or_default(company.current_systems.as_deref(), "Legacy"),
        or_default(company.budget.as_deref(), "Not specified"),
        or_default(company.timeline.as_deref(), "Flexible"),
    );
    chunks.push(tag(
        EmbeddingChunk::new(format!("company:{company_id}:profile"), profile)
            .with_metadata("type", TYPE_COMPANY_PROFILE)
            .with_metadata("section", "profile")
            .with_metadata("size", company.size.clone())
            .with_metadata("region", company.region.clone()),
    ));

    if let Some(challenges) = company
        .stated_challenges()
        .filter(|c| c.chars().count() > limits.min_challenge_chars)
    {
        chunks.push(tag(
            EmbeddingChunk::new(
                format!("company:{company_id}:challenges"),
                format!("Business Challenges for {}: {challenges}", company.name),
            )
            .with_metadata("type", TYPE_COMPANY_PROFILE)
            .with_metadata("section", "challenges"),
        ));
    }

    let substantial_files = company
        .uploaded_files
        .iter()
        .enumerate()
        .filter_map(|(position, file)| file.extracted_text().map(|text| (position, file, text)))
        .filter(|(_, _, text)| text.chars().count() > limits.min_file_chars)
        .take(limits.max_files);

    for (position, file, text) in substantial_files {
        // Names can slug alike, so the upload position keeps ids distinct.
        let key = format!("{position}-{}", slugify(&file.name));
        for (n, excerpt) in file_chunker
            .split(text)
            .take(limits.max_chunks_per_file)
            .enumerate()
        {
            chunks.push(tag(
                EmbeddingChunk::new(
                    format!("company:{company_id}:file:{key}:{n}"),
                    format!("File: {}\n\n{excerpt}", file.name),
                )
                .with_metadata("type", TYPE_COMPANY_FILE)
                .with_metadata("section", "file_content")
                .with_metadata("file_name", file.name.clone())
                .with_metadata("file_category", file.category.clone())
                .with_metadata("chunk_index", n as u64),
            ));
        }
    }

    if let Some(pipeline) = company.pipeline() {
        chunks.push(tag(
            EmbeddingChunk::new(
                format!("company:{company_id}:pipeline"),
                format!(
                    "Deal Pipeline for {}: {} deals, total value {}, average {}. Stages: {}.",
                    company.name,
                    pipeline.deal_count,
                    format_usd(pipeline.total_value),
                    format_usd(pipeline.average_value),
                    pipeline.stages.join(", "),
                ),
            )
            .with_metadata("type", TYPE_COMPANY_PROFILE)
            .with_metadata("section", "pipeline")
            .with_metadata("deal_count", pipeline.deal_count as u64)
            .with_metadata("total_pipeline_value", pipeline.total_value),
        ));
    }

    chunks
}
