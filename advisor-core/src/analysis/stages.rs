//! Parsing and validation of the three generation stages.
//!
//! Each stage's raw text becomes a typed output or a
//! [`AnalysisError::MalformedGeneration`] carrying that text. The narrative
//! stage takes the first two outputs as its input, so it only ever sees
//! solutions and challenges that already passed validation.

use super::drafts::{ChallengeFields, NarrativeDraft, SolutionDraft};
use super::fit_score::normalize_product_name;
use super::normalizer::coerce_challenge;
use super::AnalysisError;
use crate::config::NarrativeMinimums;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

const MAX_CHALLENGES: usize = 5;
const MIN_CHALLENGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Solutions,
    Challenges,
    Narrative,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Solutions => "solutions",
            Stage::Challenges => "challenges",
            Stage::Narrative => "narrative",
        })
    }
}

/// Strips a surrounding Markdown code fence, with or without a `json` tag.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.trim().strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_value(stage: Stage, raw: &str) -> Result<Value, AnalysisError> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| AnalysisError::malformed(stage, format!("invalid JSON: {e}"), raw))
}

/// Unwraps `{"<key>": [...]}` when a bare array was asked for.
fn unwrap_array(value: Value, keys: &[&str]) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => keys.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

/// Validated output of the solutions stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionsOutput {
    solutions: Vec<SolutionDraft>,
}

impl SolutionsOutput {
    /// Parses the solutions stage.
    ///
    /// When `catalog` is non-empty, each module is matched against it by
    /// normalized name and renamed to the catalog spelling. Modules outside
    /// the catalog are dropped; if that leaves nothing, the output is
    /// malformed. Repeated modules keep their first occurrence.
    pub fn parse(raw: &str, catalog: &[&str]) -> Result<Self, AnalysisError> {
        let stage = Stage::Solutions;
        let items = unwrap_array(parse_value(stage, raw)?, &["recommendedSolutions", "solutions"])
            .ok_or_else(|| AnalysisError::malformed(stage, "expected a JSON array of solutions", raw))?;

        let mut drafts = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Err(AnalysisError::malformed(stage, format!("solution {i} is not an object"), raw));
            }
            let draft: SolutionDraft = serde_json::from_value(item)
                .map_err(|e| AnalysisError::malformed(stage, format!("solution {i}: {e}"), raw))?;
            drafts.push(draft);
        }

        let proposed = drafts.len();
        let catalog: Vec<(&str, String)> = catalog
            .iter()
            .map(|name| (*name, normalize_product_name(name)))
            .collect();

        let mut seen = HashSet::new();
        let mut solutions = Vec::with_capacity(proposed);
        for mut draft in drafts {
            if draft.module.trim().is_empty() {
                warn!("Dropping solution without a module name");
                continue;
            }
            if !catalog.is_empty() {
                let wanted = normalize_product_name(&draft.module);
                match catalog.iter().find(|(_, normalized)| *normalized == wanted) {
                    Some((name, _)) => draft.module = name.to_string(),
                    None => {
                        warn!(module = %draft.module, "Dropping solution not among retrieved products");
                        continue;
                    }
                }
            }
            if seen.insert(normalize_product_name(&draft.module)) {
                solutions.push(draft);
            }
        }

        if !catalog.is_empty() && proposed > 0 && solutions.is_empty() {
            return Err(AnalysisError::malformed(
                stage,
                format!("none of the {proposed} recommended modules is a retrieved catalog product"),
                raw,
            ));
        }
        Ok(Self { solutions })
    }

    pub fn solutions(&self) -> &[SolutionDraft] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<SolutionDraft> {
        self.solutions
    }
}

/// A stage-two entry before it is turned into a sentence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ChallengeEntry {
    Text(String),
    Structured(ChallengeFields),
    Other(Value),
}

impl From<Value> for ChallengeEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ChallengeEntry::Text(text),
            value @ Value::Object(_) => {
                ChallengeEntry::Structured(serde_json::from_value(value).unwrap_or_default())
            }
            other => ChallengeEntry::Other(other),
        }
    }
}

/// Validated output of the challenges stage: 1 to 5 sentences, each at
/// least the configured length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengesOutput {
    challenges: Vec<String>,
}

impl ChallengesOutput {
    pub fn parse(raw: &str, vendor: &str, min_chars: usize) -> Result<Self, AnalysisError> {
        let stage = Stage::Challenges;
        let items = unwrap_array(parse_value(stage, raw)?, &["businessChallenges", "challenges"])
            .ok_or_else(|| AnalysisError::malformed(stage, "expected a JSON array of challenges", raw))?;

        let mut challenges: Vec<String> = items
            .into_iter()
            .map(|item| coerce_challenge(ChallengeEntry::from(item), vendor))
            .collect();

        if challenges.is_empty() {
            return Err(AnalysisError::malformed(stage, "no business challenges returned", raw));
        }
        if challenges.len() > MAX_CHALLENGES {
            warn!(returned = challenges.len(), kept = MAX_CHALLENGES, "Truncating business challenges");
            challenges.truncate(MAX_CHALLENGES);
        }

        if let Some((i, short)) = challenges
            .iter()
            .enumerate()
            .find(|(_, c)| c.chars().count() < min_chars)
        {
            return Err(AnalysisError::malformed(
                stage,
                format!(
                    "challenge {i} is {} characters, minimum is {min_chars}",
                    short.chars().count()
                ),
                raw,
            ));
        }
        Ok(Self { challenges })
    }

    /// Tops the list up to three entries from `defaults`, skipping any the
    /// generator already named.
    pub fn pad_from(mut self, defaults: &[String], industry: &str) -> Self {
        let missing = MIN_CHALLENGES.saturating_sub(self.challenges.len());
        if missing == 0 {
            return self;
        }

        let padding: Vec<String> = defaults
            .iter()
            .filter(|d| {
                let d = d.to_lowercase();
                !self.challenges.iter().any(|c| c.to_lowercase().contains(&d))
            })
            .take(missing)
            .map(|d| {
                format!("{d} is a common pressure point for {industry} organizations and weighs on day-to-day operations.")
            })
            .collect();

        info!(
            returned = self.challenges.len(),
            padded = padding.len(),
            "Padding business challenges with industry defaults"
        );
        self.challenges.extend(padding);
        self
    }

    pub fn challenges(&self) -> &[String] {
        &self.challenges
    }

    pub fn into_challenges(self) -> Vec<String> {
        self.challenges
    }
}

/// What the narrative stage is given: the exact, validated output of the
/// first two stages.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInput<'a> {
    pub solutions: &'a SolutionsOutput,
    pub challenges: &'a ChallengesOutput,
}

impl<'a> NarrativeInput<'a> {
    pub fn new(solutions: &'a SolutionsOutput, challenges: &'a ChallengesOutput) -> Self {
        Self { solutions, challenges }
    }

    pub(crate) fn solutions_json(&self) -> String {
        serde_json::to_string_pretty(self.solutions.solutions()).unwrap_or_default()
    }

    pub(crate) fn challenges_json(&self) -> String {
        serde_json::to_string_pretty(self.challenges.challenges()).unwrap_or_default()
    }
}

/// Lifts sections out of the nested wrappers some generations use
/// (`coreAnalysisFields`, `financialAnalysis.businessCase`, ...).
fn flatten_narrative(mut map: serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    for wrapper in ["coreAnalysisFields", "detailedAnalysisSections", "implementationStrategy"] {
        if let Some(Value::Object(inner)) = map.remove(wrapper) {
            for (key, value) in inner {
                map.entry(key).or_insert(value);
            }
        }
    }

    let nested_financials = matches!(
        map.get("financialAnalysis"),
        Some(Value::Object(fin)) if fin.contains_key("businessCase")
    );
    if nested_financials {
        if let Some(Value::Object(mut fin)) = map.remove("financialAnalysis") {
            if let Some(case) = fin.remove("businessCase") {
                map.entry("businessCase").or_insert(case);
            }
            if let Some(analysis) = fin.remove("financialAnalysis") {
                map.insert("financialAnalysis".to_string(), analysis);
            }
        }
    }
    map
}

impl NarrativeDraft {
    /// Parses the narrative stage and checks the three analysis sections
    /// against their minimum lengths. Copies of the solutions or challenges
    /// in the output are ignored.
    pub fn parse(raw: &str, minimums: &NarrativeMinimums) -> Result<Self, AnalysisError> {
        let stage = Stage::Narrative;
        let Value::Object(map) = parse_value(stage, raw)? else {
            return Err(AnalysisError::malformed(stage, "expected a JSON object", raw));
        };
        let draft: NarrativeDraft = serde_json::from_value(Value::Object(flatten_narrative(map)))
            .map_err(|e| AnalysisError::malformed(stage, e.to_string(), raw))?;

        let sections = [
            ("companyProfileAnalysis", &draft.company_profile_analysis, minimums.company_profile),
            ("businessContextAnalysis", &draft.business_context_analysis, minimums.business_context),
            ("analysisMethodology", &draft.analysis_methodology, minimums.methodology),
        ];
        for (name, text, minimum) in sections {
            let len = text.chars().count();
            if len < minimum {
                return Err(AnalysisError::malformed(
                    stage,
                    format!("{name} is {len} characters, minimum is {minimum}"),
                    raw,
                ));
            }
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn long(prefix: &str, len: usize) -> String {
        let mut text = format!("{prefix} ");
        while text.len() < len {
            text.push_str("Operations depend on manual reconciliation. ");
        }
        text
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  [2] "), "[2]");
        assert_eq!(strip_code_fences("```JSON [3]```"), "[3]");
    }

    #[test]
    fn test_solutions_keep_catalog_names() {
        let raw = json!([
            {"module": "sap ariba", "fitScore": 72},
            {"module": "SAP S/4HANA Cloud", "fitScore": 90},
            {"module": "SAP Integrated Business Planning (IBP)"},
            {"module": "SAP Ariba"}
        ])
        .to_string();
        let catalog = ["SAP Ariba", "SAP Integrated Business Planning"];

        let output = SolutionsOutput::parse(&raw, &catalog).unwrap();
        let modules: Vec<_> = output.solutions().iter().map(|s| s.module.as_str()).collect();
        assert_eq!(modules, vec!["SAP Ariba", "SAP Integrated Business Planning"]);
    }

    #[test]
    fn test_solutions_all_outside_catalog() {
        let raw = r#"[{"module": "Oracle NetSuite"}]"#;
        let err = SolutionsOutput::parse(raw, &["SAP Ariba"]).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedGeneration { stage: Stage::Solutions, .. }));
        assert_eq!(err.raw_text(), Some(raw));
    }

    #[test]
    fn test_solutions_without_catalog() {
        let raw = "```json\n{\"recommendedSolutions\": [{\"productName\": \"SAP SuccessFactors\", \"fit\": \"High\"}]}\n```";
        let output = SolutionsOutput::parse(raw, &[]).unwrap();
        assert_eq!(output.solutions()[0].module, "SAP SuccessFactors");
        assert_eq!(output.solutions()[0].fit.as_deref(), Some("High"));

        assert!(SolutionsOutput::parse("[]", &["SAP Ariba"]).unwrap().solutions().is_empty());
    }

    #[test]
    fn test_solutions_malformed() {
        let raw = "Here are my recommendations: SAP Ariba";
        let err = SolutionsOutput::parse(raw, &[]).unwrap_err();
        assert_eq!(err.raw_text(), Some(raw));
        assert!(SolutionsOutput::parse(r#"["SAP Ariba"]"#, &[]).is_err());
        assert!(SolutionsOutput::parse(r#"{"answer": 1}"#, &[]).is_err());
    }

    #[test]
    fn test_challenges_mixed_entries() {
        let raw = json!([
            long("Procurement approvals", 90),
            {
                "business_process": "Order to cash",
                "pain_points": "Invoices are keyed by hand from emailed purchase orders",
                "impact": "Days sales outstanding sits at 64 days",
                "sap_alignment": "SAP S/4HANA automates billing",
                "industry_context": "Distributors run on thin margins"
            },
            42
        ])
        .to_string();

        let output = ChallengesOutput::parse(&raw, "SAP", 20).unwrap();
        let challenges = output.challenges();
        assert_eq!(challenges.len(), 3);
        assert!(challenges[1].starts_with("Order to cash: Invoices are keyed by hand"));
        assert_eq!(challenges[2], "Business challenge requiring SAP solution implementation");
    }

    #[test]
    fn test_short_challenge_list_padded_from_defaults() {
        let raw = json!([long("Supply chain complexity drives late deliveries.", 90)]).to_string();
        let defaults = crate::knowledge::seed::default_challenges("Manufacturing");

        let output = ChallengesOutput::parse(&raw, "SAP", 80)
            .unwrap()
            .pad_from(&defaults, "Manufacturing");
        let challenges = output.challenges();
        assert_eq!(challenges.len(), 3);
        assert!(challenges[0].starts_with("Supply chain complexity drives"));
        // Already covered by the generated entry.
        assert!(challenges[1].starts_with("Quality control and compliance is a common pressure point"));
        assert!(challenges[2].starts_with("Production planning and scheduling"));
        assert!(challenges.iter().all(|c| c.chars().count() >= 80));

        let full: Vec<String> = (0..4).map(|i| long(&format!("Challenge {i}."), 100)).collect();
        let output = ChallengesOutput::parse(&json!(full).to_string(), "SAP", 80)
            .unwrap()
            .pad_from(&defaults, "Manufacturing");
        assert_eq!(output.challenges().len(), 4);
    }

    #[test]
    fn test_challenges_truncated_to_five() {
        let items: Vec<String> = (0..7).map(|i| long(&format!("Challenge {i}."), 100)).collect();
        let output = ChallengesOutput::parse(&json!(items).to_string(), "SAP", 80).unwrap();
        assert_eq!(output.challenges().len(), 5);
        assert!(output.challenges()[4].starts_with("Challenge 4."));
    }

    #[test]
    fn test_challenges_rejected() {
        let err = ChallengesOutput::parse("[]", "SAP", 80).unwrap_err();
        assert!(err.to_string().contains("no business challenges"));

        let err = ChallengesOutput::parse(r#"["Too short"]"#, "SAP", 80).unwrap_err();
        assert!(err.to_string().contains("challenge 0 is 9 characters"));

        // The fallback sentence is shorter than the default minimum.
        assert!(ChallengesOutput::parse("[null]", "SAP", 80).is_err());
    }

    #[test]
    fn test_narrative_nested_layout() {
        let raw = json!({
            "coreAnalysisFields": {
                "executiveSummary": "Acme should modernize procurement first.",
                "recommendedSolutions": [{"module": "Ignored"}]
            },
            "detailedAnalysisSections": {
                "companyProfileAnalysis": long("INDUSTRY ANALYSIS:", 450),
                "businessContextAnalysis": long("BUSINESS CHALLENGES:", 450),
                "aiAnalysisMethodology": long("DATA SOURCES:", 650)
            },
            "financialAnalysis": {
                "businessCase": {"totalInvestment": "$2,000,000", "projectedSavings": 600000},
                "financialAnalysis": {"roiAnalysis": "Payback in year three."}
            },
            "implementationStrategy": {
                "implementationRoadmap": [{"phase": "Discover", "duration": "4 weeks"}, "not a phase"],
                "riskFactors": ["Change fatigue"],
                "competitiveAnalysis": {"sapAdvantages": ["Integrated suite"]}
            }
        })
        .to_string();

        let draft = NarrativeDraft::parse(&raw, &NarrativeMinimums::default()).unwrap();
        assert_eq!(draft.business_case.total_investment, Some(2_000_000.0));
        assert_eq!(draft.financial_analysis.roi_analysis, "Payback in year three.");
        assert_eq!(draft.implementation_roadmap.len(), 1);
        assert_eq!(draft.competitive_analysis.advantages, vec!["Integrated suite"]);
        assert_eq!(draft.risk_factors, vec!["Change fatigue"]);
        assert!(draft.analysis_methodology.starts_with("DATA SOURCES:"));
        assert_eq!(draft.executive_summary, "Acme should modernize procurement first.");
    }

    #[test]
    fn test_narrative_section_minimums() {
        let raw = json!({
            "companyProfileAnalysis": long("Profile.", 450),
            "businessContextAnalysis": "Too short.",
            "analysisMethodology": long("Method.", 650)
        })
        .to_string();
        let err = NarrativeDraft::parse(&raw, &NarrativeMinimums::default()).unwrap_err();
        assert!(err.to_string().contains("businessContextAnalysis is 10 characters"));

        assert!(NarrativeDraft::parse("[]", &NarrativeMinimums::default()).is_err());
    }
}
