//! Generator-shaped records, before scoring and normalization.
//!
//! Every field is optional on the wire; missing or oddly typed values
//! deserialize to empty and are filled in by the normalizer.

use super::lenient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recommended solution as the solutions stage produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolutionDraft {
    #[serde(alias = "productName", alias = "product_name", deserialize_with = "lenient::text")]
    pub module: String,
    #[serde(alias = "fit_score", deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub fit_score: Option<f64>,
    /// `High`, `Medium` or `Low`.
    #[serde(alias = "fitLevel", alias = "fit_level", deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub fit: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub fit_justification: String,
    #[serde(
        rename = "estimatedROI",
        alias = "estimatedRoi",
        alias = "estimated_roi",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_roi: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub time_to_value: Option<String>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub estimated_cost_min: Option<f64>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub estimated_cost_max: Option<f64>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_benefits: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub implementation_complexity: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub technical_requirements: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub business_impact: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub risk_mitigation: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub success_metrics: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub module_analysis_context: String,
}

/// A challenge the generator returned as an object instead of a sentence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChallengeFields {
    #[serde(alias = "businessProcess", deserialize_with = "lenient::opt_text")]
    pub business_process: Option<String>,
    #[serde(alias = "painPoints", deserialize_with = "lenient::opt_text")]
    pub pain_points: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub impact: Option<String>,
    #[serde(
        alias = "sapAlignment",
        alias = "sap_alignment",
        alias = "vendorAlignment",
        alias = "solutionAlignment",
        deserialize_with = "lenient::opt_text"
    )]
    pub vendor_alignment: Option<String>,
    #[serde(alias = "industryContext", deserialize_with = "lenient::opt_text")]
    pub industry_context: Option<String>,
}

/// Business case figures, including the alternative names generators use.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessCaseDraft {
    #[serde(deserialize_with = "lenient::number")]
    pub total_investment: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub projected_savings: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub payback_period: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub net_present_value: Option<f64>,
    #[serde(rename = "riskAdjustedROI", alias = "riskAdjustedRoi", deserialize_with = "lenient::number")]
    pub risk_adjusted_roi: Option<f64>,

    #[serde(deserialize_with = "lenient::number")]
    pub estimated_cost_min: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub estimated_cost_max: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_estimated_cost: Option<f64>,
    #[serde(rename = "estimatedROI", alias = "estimatedRoi", deserialize_with = "lenient::number")]
    pub estimated_roi: Option<f64>,
    #[serde(rename = "totalEstimatedROI", alias = "totalEstimatedRoi", deserialize_with = "lenient::number")]
    pub total_estimated_roi: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub time_to_value: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub total_time_to_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialAnalysisDraft {
    #[serde(deserialize_with = "lenient::text")]
    pub investment_calculation: String,
    #[serde(deserialize_with = "lenient::text")]
    pub savings_projection: String,
    #[serde(deserialize_with = "lenient::text")]
    pub roi_analysis: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoadmapPhaseDraft {
    #[serde(alias = "name", deserialize_with = "lenient::text")]
    pub phase: String,
    #[serde(deserialize_with = "lenient::text")]
    pub duration: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub activities: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub deliverables: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub resources: Vec<String>,
    #[serde(alias = "cost", deserialize_with = "lenient::number")]
    pub calculated_cost: Option<f64>,
    #[serde(alias = "modules", deserialize_with = "lenient::string_list")]
    pub solutions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompetitiveAnalysisDraft {
    #[serde(alias = "sapAdvantages", alias = "vendorAdvantages", deserialize_with = "lenient::string_list")]
    pub advantages: Vec<String>,
    #[serde(deserialize_with = "lenient::string_map")]
    pub competitor_comparison: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub differentiators: Vec<String>,
}

/// The narrative stage's output, flattened to one level.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeDraft {
    #[serde(deserialize_with = "lenient::text")]
    pub company_profile_analysis: String,
    #[serde(deserialize_with = "lenient::text")]
    pub business_context_analysis: String,
    #[serde(alias = "aiAnalysisMethodology", deserialize_with = "lenient::text")]
    pub analysis_methodology: String,
    #[serde(deserialize_with = "lenient::object_or_default")]
    pub business_case: BusinessCaseDraft,
    #[serde(deserialize_with = "lenient::object_or_default")]
    pub financial_analysis: FinancialAnalysisDraft,
    #[serde(deserialize_with = "lenient::object_list")]
    pub implementation_roadmap: Vec<RoadmapPhaseDraft>,
    #[serde(deserialize_with = "lenient::object_or_default")]
    pub competitive_analysis: CompetitiveAnalysisDraft,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_success_factors: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub risk_factors: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub next_steps: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub executive_summary: String,
}
