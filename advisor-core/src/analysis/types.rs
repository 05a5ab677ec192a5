//! The analysis returned to callers.

use super::usage::UsageLedger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a solution's fit score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// Similarity of the matching catalog product to the company query.
    Retrieval,
    /// A numeric score in the generated solution.
    Generator,
    /// A `High`/`Medium`/`Low` label in the generated solution.
    Label,
    Default,
}

/// Overall fit tier of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallFit {
    Excellent,
    High,
    Medium,
    Low,
}

impl OverallFit {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            OverallFit::Excellent
        } else if score >= 60.0 {
            OverallFit::High
        } else if score >= 40.0 {
            OverallFit::Medium
        } else {
            OverallFit::Low
        }
    }
}

impl fmt::Display for OverallFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallFit::Excellent => "Excellent",
            OverallFit::High => "High",
            OverallFit::Medium => "Medium",
            OverallFit::Low => "Low",
        })
    }
}

/// A catalog product recommended for the company, ranked by fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedSolution {
    pub module: String,
    /// 0 to 100, two decimal places.
    pub fit_score: f64,
    /// 1 for the best fit; contiguous across the analysis.
    pub priority: u32,
    pub score_source: ScoreSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_score: Option<f64>,
    pub fit_justification: String,
    /// Percent.
    #[serde(rename = "estimatedROI")]
    pub estimated_roi: f64,
    pub time_to_value: String,
    pub estimated_cost_min: f64,
    pub estimated_cost_max: f64,
    pub key_benefits: Vec<String>,
    pub implementation_complexity: String,
    pub technical_requirements: Vec<String>,
    pub business_impact: String,
    pub risk_mitigation: Vec<String>,
    pub success_metrics: Vec<String>,
    pub module_analysis_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessCase {
    pub total_investment: f64,
    /// Annual savings.
    pub projected_savings: f64,
    pub payback_period: String,
    /// Five years at an 8% discount rate.
    pub net_present_value: f64,
    /// Percent.
    #[serde(rename = "riskAdjustedROI")]
    pub risk_adjusted_roi: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysis {
    pub investment_calculation: String,
    pub savings_projection: String,
    pub roi_analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapPhase {
    pub phase: String,
    pub duration: String,
    pub activities: Vec<String>,
    pub deliverables: Vec<String>,
    pub resources: Vec<String>,
    pub calculated_cost: f64,
    /// Recommended modules delivered in this phase.
    pub solutions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitiveAnalysis {
    pub vendor_advantages: Vec<String>,
    pub competitor_comparison: BTreeMap<String, String>,
    pub differentiators: Vec<String>,
}

/// A complete, normalized solution analysis for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub company_name: String,
    pub recommended_solutions: Vec<RecommendedSolution>,
    pub business_challenges: Vec<String>,
    /// Mean fit of the top three solutions.
    pub fit_score: f64,
    pub overall_fit: OverallFit,
    pub company_profile_analysis: String,
    pub business_context_analysis: String,
    pub analysis_methodology: String,
    pub key_success_factors: Vec<String>,
    pub business_case: BusinessCase,
    pub financial_analysis: FinancialAnalysis,
    pub implementation_roadmap: Vec<RoadmapPhase>,
    pub competitive_analysis: CompetitiveAnalysis,
    pub risk_factors: Vec<String>,
    pub next_steps: Vec<String>,
    pub executive_summary: String,
    pub usage: UsageLedger,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_fit_tiers() {
        assert_eq!(OverallFit::from_score(80.0), OverallFit::Excellent);
        assert_eq!(OverallFit::from_score(79.99), OverallFit::High);
        assert_eq!(OverallFit::from_score(60.0), OverallFit::High);
        assert_eq!(OverallFit::from_score(40.0), OverallFit::Medium);
        assert_eq!(OverallFit::from_score(0.0), OverallFit::Low);
    }

    #[test]
    fn test_business_case_wire_names() {
        let json = serde_json::to_value(BusinessCase {
            total_investment: 1_500_000.0,
            projected_savings: 450_000.0,
            payback_period: "3.3 years".to_string(),
            net_present_value: 296_728.0,
            risk_adjusted_roi: 30.0,
        })
        .unwrap();
        assert_eq!(json["riskAdjustedROI"], 30.0);
        assert_eq!(json["netPresentValue"], 296_728.0);
    }
}
