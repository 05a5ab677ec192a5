//! Static knowledge: catalog products, industry contexts and best practices,
//! and the chunks they are stored as.

use super::seed;
use super::{TYPE_BEST_PRACTICE, TYPE_CATALOG_PRODUCT, TYPE_INDUSTRY_CONTEXT};
use crate::rag::EmbeddingChunk;
use crate::text::{format_usd, slugify};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A product row as stored in the catalog database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub target_industries: Vec<String>,
    #[serde(default)]
    pub implementation_months_min: Option<u32>,
    #[serde(default)]
    pub implementation_months_max: Option<u32>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Longer implementations are harder: over a year is High, over six
    /// months Medium.
    pub fn from_months(max_months: u32) -> Self {
        if max_months > 12 {
            Complexity::High
        } else if max_months > 6 {
            Complexity::Medium
        } else {
            Complexity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product enriched with the facts the prompts and fallbacks use.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductProfile {
    pub name: String,
    pub description: String,
    pub category: String,
    pub industries: Vec<String>,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub use_cases: Vec<String>,
    pub complexity: Complexity,
    pub typical_roi: String,
    pub time_to_value: String,
    pub cost_range: String,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

const TYPICAL_ROI: &str = "15-25%";

impl From<&CatalogProduct> for ProductProfile {
    fn from(row: &CatalogProduct) -> Self {
        let months_max = row.implementation_months_max.unwrap_or(12);
        let months_min = row.implementation_months_min.unwrap_or(months_max.min(6));
        let cost_range = match (row.price_min, row.price_max) {
            (Some(min), Some(max)) => format!("{}-{}", format_usd(min), format_usd(max)),
            (Some(only), None) | (None, Some(only)) => format_usd(only),
            (None, None) => "Contact for pricing".to_string(),
        };

        Self {
            name: row.product_name.trim().to_string(),
            description: row.description.trim().to_string(),
            category: row.category.clone(),
            industries: row.target_industries.clone(),
            features: seed::features_for(&row.category),
            benefits: seed::benefits_for(&row.category),
            use_cases: seed::use_cases_for(&row.category),
            complexity: Complexity::from_months(months_max),
            typical_roi: TYPICAL_ROI.to_string(),
            time_to_value: format!("{months_min}-{months_max} months"),
            cost_range,
            price_min: row.price_min,
            price_max: row.price_max,
        }
    }
}

impl ProductProfile {
    /// The four chunks a product is stored as: overview, features, benefits
    /// and implementation.
    ///
    /// Every chunk carries the product name, its target industries and its
    /// implementation facts, so whichever section a search returns can seed
    /// fallbacks for that product.
    pub fn chunks(&self, vendor: &str) -> Vec<EmbeddingChunk> {
        let slug = slugify(&self.name);
        let label = vendor_label(vendor, &self.name);

        let sections = [
            (
                "overview",
                format!(
                    "{label}: {}. This product targets industries including {}. Typical use cases: {}.",
                    self.description.trim_end_matches('.'),
                    self.industries.join(", "),
                    self.use_cases.join(", "),
                ),
            ),
            (
                "features",
                format!("Key features of {label}: {}.", self.features.join(". ")),
            ),
            (
                "benefits",
                format!("Benefits of {label}: {}.", self.benefits.join(". ")),
            ),
            (
                "implementation",
                format!(
                    "{label} implementation: Complexity is {}, typical ROI is {}, time to value is {}, and cost range is {}.",
                    self.complexity, self.typical_roi, self.time_to_value, self.cost_range,
                ),
            ),
        ];

        sections
            .into_iter()
            .map(|(section, content)| {
                let mut chunk = EmbeddingChunk::new(format!("product:{slug}:{section}"), content)
                    .with_metadata("type", TYPE_CATALOG_PRODUCT)
                    .with_metadata("section", section)
                    .with_metadata("product_name", self.name.clone())
                    .with_metadata("category", self.category.clone())
                    .with_metadata("industries", self.industries.clone())
                    .with_metadata("complexity", self.complexity.as_str())
                    .with_metadata("roi", self.typical_roi.clone())
                    .with_metadata("time_to_value", self.time_to_value.clone())
                    .with_metadata("cost_range", self.cost_range.clone());
                if let Some(min) = self.price_min {
                    chunk = chunk.with_metadata("price_min", min);
                }
                if let Some(max) = self.price_max {
                    chunk = chunk.with_metadata("price_max", max);
                }
                chunk
            })
            .collect()
    }
}

/// Product names usually already start with the vendor ("SAP Ariba").
fn vendor_label(vendor: &str, name: &str) -> String {
    if vendor.is_empty() || name.to_lowercase().starts_with(&vendor.to_lowercase()) {
        name.to_string()
    } else {
        format!("{vendor} {name}")
    }
}

/// Reference knowledge about one industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryContext {
    pub industry: String,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub success_stories: Vec<String>,
    #[serde(default)]
    pub best_practices: Vec<String>,
}

impl IndustryContext {
    pub fn chunks(&self, vendor: &str) -> Vec<EmbeddingChunk> {
        let slug = slugify(&self.industry);
        let industry = &self.industry;
        let solutions_label = if vendor.is_empty() {
            "Solutions".to_string()
        } else {
            format!("{vendor} solutions")
        };

        let top = |items: &[String]| items.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        let mut overview = format!(
            "{industry} industry overview: Key challenges include {}. Current trends include {}.",
            top(&self.challenges),
            top(&self.trends),
        );
        if !self.success_stories.is_empty() {
            overview.push_str(&format!(" Success stories: {}.", self.success_stories.join(". ")));
        }

        let sections = [
            ("overview", "overview", overview),
            (
                "challenges",
                "challenges",
                format!("{industry} challenges: {}.", self.challenges.join(". ")),
            ),
            (
                "solutions",
                "solutions",
                format!("{solutions_label} for {industry}: {}.", self.solutions.join(", ")),
            ),
            (
                "best-practices",
                "best_practices",
                format!("Best practices for {industry}: {}.", self.best_practices.join(". ")),
            ),
        ];

        sections
            .into_iter()
            .map(|(suffix, category, content)| {
                EmbeddingChunk::new(format!("industry:{slug}:{suffix}"), content)
                    .with_metadata("type", TYPE_INDUSTRY_CONTEXT)
                    .with_metadata("industry", industry.clone())
                    .with_metadata("category", category)
            })
            .collect()
    }
}

/// A free-form best-practice note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPractice {
    pub category: String,
    pub title: String,
    pub content: String,
}

impl BestPractice {
    pub fn chunk(&self) -> EmbeddingChunk {
        EmbeddingChunk::new(
            format!("practice:{}", slugify(&self.category)),
            format!("{}: {}", self.title, self.content),
        )
        .with_metadata("type", TYPE_BEST_PRACTICE)
        .with_metadata("category", self.category.clone())
        .with_metadata("title", self.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ariba() -> CatalogProduct {
        CatalogProduct {
            product_name: "SAP Ariba".to_string(),
            description: "Cloud procurement suite.".to_string(),
            category: "Procurement".to_string(),
            target_industries: vec!["Manufacturing".to_string(), "Retail".to_string()],
            implementation_months_min: Some(6),
            implementation_months_max: Some(9),
            price_min: Some(250_000.0),
            price_max: Some(400_000.0),
        }
    }

    #[test]
    fn test_product_profile_derivation() {
        let profile = ProductProfile::from(&ariba());
        assert_eq!(profile.complexity, Complexity::Medium);
        assert_eq!(profile.time_to_value, "6-9 months");
        assert_eq!(profile.cost_range, "$250,000-$400,000");
        assert_eq!(profile.typical_roi, "15-25%");
        assert_eq!(profile.features[0], "End-to-end procurement process automation");
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(Complexity::from_months(6), Complexity::Low);
        assert_eq!(Complexity::from_months(7), Complexity::Medium);
        assert_eq!(Complexity::from_months(12), Complexity::Medium);
        assert_eq!(Complexity::from_months(13), Complexity::High);
    }

    #[test]
    fn test_missing_pricing() {
        let mut row = ariba();
        row.price_min = None;
        row.price_max = None;
        row.implementation_months_min = None;
        row.implementation_months_max = None;
        let profile = ProductProfile::from(&row);
        assert_eq!(profile.cost_range, "Contact for pricing");
        assert_eq!(profile.time_to_value, "6-12 months");
    }

    #[test]
    fn test_product_chunks() {
        let chunks = ProductProfile::from(&ariba()).chunks("SAP");
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "product:sap-ariba:overview",
                "product:sap-ariba:features",
                "product:sap-ariba:benefits",
                "product:sap-ariba:implementation",
            ]
        );

        for chunk in &chunks {
            assert_eq!(chunk.metadata["type"], "catalog_product");
            assert_eq!(chunk.metadata["product_name"], "SAP Ariba");
            assert_eq!(chunk.metadata["industries"], serde_json::json!(["Manufacturing", "Retail"]));
            assert_eq!(chunk.metadata["price_max"], serde_json::json!(400_000.0));
        }
        // The vendor prefix is not doubled.
        assert!(chunks[0].content.starts_with("SAP Ariba: Cloud procurement suite."));
        assert!(chunks[3].content.contains("Complexity is Medium"));
    }

    #[test]
    fn test_industry_chunks() {
        let manufacturing = &seed::industry_contexts()[1];
        let chunks = manufacturing.chunks("SAP");
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].id, "industry:manufacturing:overview");
        assert_eq!(chunks[3].id, "industry:manufacturing:best-practices");
        assert_eq!(chunks[3].metadata["category"], "best_practices");
        assert!(chunks[2].content.starts_with("SAP solutions for Manufacturing"));
    }

    #[test]
    fn test_best_practice_chunk() {
        let chunk = seed::best_practices()[2].chunk();
        assert_eq!(chunk.id, "practice:change-management");
        assert_eq!(chunk.metadata["type"], "best_practice");
        assert_eq!(chunk.metadata["category"], "change_management");
    }
}
