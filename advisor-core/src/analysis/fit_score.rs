//! Fit scoring and ranking of recommended solutions.

use super::drafts::SolutionDraft;
use super::types::{OverallFit, ScoreSource};
use crate::knowledge::ContextBundle;
use crate::text::round2;

const DEFAULT_SCORE: f64 = 60.0;
const TOP_N: usize = 3;

/// Canonical form used to match generated module names to catalog products:
/// lowercase, whitespace collapsed, trailing parenthetical removed.
///
/// `"SAP  Integrated Business Planning (IBP)"` → `"sap integrated business planning"`
pub fn normalize_product_name(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if collapsed.ends_with(')') {
        if let Some(open) = collapsed.rfind('(') {
            let stripped = collapsed[..open].trim_end();
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    collapsed
}

/// A score and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitScore {
    pub value: f64,
    pub source: ScoreSource,
    /// Raw similarity of the matching product, when there was one.
    pub retrieval_score: Option<f64>,
}

/// A solution with its score and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSolution {
    pub draft: SolutionDraft,
    pub fit: FitScore,
    /// 1-based.
    pub priority: u32,
}

/// Scores solutions against the retrieved catalog products.
///
/// One precedence rule applies everywhere: the similarity of the matching
/// retrieved product, then the generator's numeric score, then its fit
/// label, then a flat default.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitScoreCalculator;

impl FitScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Scores one solution on a 0-100 scale, rounded to two decimals.
    pub fn score(&self, solution: &SolutionDraft, bundle: &ContextBundle) -> FitScore {
        let wanted = normalize_product_name(&solution.module);
        let similarity = bundle
            .relevant_products
            .iter()
            .filter(|hit| {
                hit.meta_str("product_name")
                    .is_some_and(|name| normalize_product_name(name) == wanted)
            })
            .map(|hit| f64::from(hit.score))
            .filter(|score| score.is_finite())
            .reduce(f64::max);

        let (raw, source) = if let Some(similarity) = similarity {
            (similarity * 100.0, ScoreSource::Retrieval)
        } else if let Some(score) = solution.fit_score.filter(|s| s.is_finite()) {
            (score, ScoreSource::Generator)
        } else if let Some(label) = solution.fit.as_deref() {
            (label_score(label), ScoreSource::Label)
        } else {
            (DEFAULT_SCORE, ScoreSource::Default)
        };

        FitScore {
            value: round2(raw.clamp(0.0, 100.0)),
            source,
            retrieval_score: similarity,
        }
    }

    /// Scores and sorts solutions best first, assigning priorities 1..N.
    /// Ties keep the generator's order.
    pub fn rank(&self, solutions: Vec<SolutionDraft>, bundle: &ContextBundle) -> Vec<ScoredSolution> {
        let mut scored: Vec<(SolutionDraft, FitScore)> = solutions
            .into_iter()
            .map(|draft| {
                let fit = self.score(&draft, bundle);
                (draft, fit)
            })
            .collect();
        scored.sort_by(|a, b| b.1.value.total_cmp(&a.1.value));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (draft, fit))| ScoredSolution {
                draft,
                fit,
                priority: i as u32 + 1,
            })
            .collect()
    }

    /// Mean of the top three scores and its tier. No solutions is `0` / `Low`.
    pub fn overall(&self, ranked: &[ScoredSolution]) -> (f64, OverallFit) {
        let top: Vec<f64> = ranked.iter().take(TOP_N).map(|s| s.fit.value).collect();
        if top.is_empty() {
            return (0.0, OverallFit::Low);
        }
        let mean = round2(top.iter().sum::<f64>() / top.len() as f64);
        (mean, OverallFit::from_score(mean))
    }
}

fn label_score(label: &str) -> f64 {
    let label = label.to_lowercase();
    if label.contains("high") {
        85.0
    } else if label.contains("medium") {
        65.0
    } else if label.contains("low") {
        40.0
    } else {
        DEFAULT_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::VectorSearchResult;
    use serde_json::json;

    fn hit(name: &str, score: f32) -> VectorSearchResult {
        VectorSearchResult {
            id: format!("product:{name}:overview"),
            score,
            content: String::new(),
            metadata: json!({"type": "catalog_product", "product_name": name})
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    fn draft(module: &str) -> SolutionDraft {
        SolutionDraft {
            module: module.to_string(),
            ..SolutionDraft::default()
        }
    }

    fn bundle(hits: Vec<VectorSearchResult>) -> ContextBundle {
        ContextBundle {
            relevant_products: hits,
            ..ContextBundle::default()
        }
    }

    #[test]
    fn test_normalize_product_name() {
        assert_eq!(normalize_product_name("  SAP   Ariba "), "sap ariba");
        assert_eq!(normalize_product_name("SAP Integrated Business Planning (IBP)"), "sap integrated business planning");
        assert_eq!(normalize_product_name("(IBP)"), "(ibp)");
        assert_eq!(normalize_product_name("SAP (Cloud) Platform"), "sap (cloud) platform");
    }

    #[test]
    fn test_scores_from_retrieval_rank_densely() {
        let calculator = FitScoreCalculator::new();
        let bundle = bundle(vec![
            hit("SAP S/4HANA", 0.91),
            hit("SAP Ariba", 0.77),
            hit("SAP Integrated Business Planning", 0.52),
        ]);
        let drafts = vec![
            draft("SAP Integrated Business Planning (IBP)"),
            draft("sap s/4hana"),
            draft("SAP Ariba"),
        ];

        let ranked = calculator.rank(drafts, &bundle);
        let scores: Vec<f64> = ranked.iter().map(|s| s.fit.value).collect();
        let priorities: Vec<u32> = ranked.iter().map(|s| s.priority).collect();
        assert_eq!(scores, vec![91.0, 77.0, 52.0]);
        assert_eq!(priorities, vec![1, 2, 3]);
        assert!(ranked.iter().all(|s| s.fit.source == ScoreSource::Retrieval));

        let (overall, tier) = calculator.overall(&ranked);
        assert_eq!(overall, 73.33);
        assert_eq!(tier, OverallFit::High);
    }

    #[test]
    fn test_fallback_precedence() {
        let calculator = FitScoreCalculator::new();
        let empty = ContextBundle::default();

        let mut generated = draft("SAP Ariba");
        generated.fit_score = Some(140.0);
        generated.fit = Some("Low".to_string());
        let score = calculator.score(&generated, &empty);
        assert_eq!((score.value, score.source), (100.0, ScoreSource::Generator));

        let mut labelled = draft("SAP Ariba");
        labelled.fit = Some("Medium-High".to_string());
        assert_eq!(calculator.score(&labelled, &empty).value, 85.0);
        labelled.fit = Some("medium".to_string());
        assert_eq!(calculator.score(&labelled, &empty).value, 65.0);
        labelled.fit = Some("Strong".to_string());
        assert_eq!(calculator.score(&labelled, &empty).value, 60.0);

        let default = calculator.score(&draft("SAP Ariba"), &empty);
        assert_eq!((default.value, default.source), (60.0, ScoreSource::Default));
    }

    #[test]
    fn test_retrieval_beats_generator_score() {
        let mut generated = draft("SAP Ariba");
        generated.fit_score = Some(99.0);
        let score = FitScoreCalculator::new().score(&generated, &bundle(vec![hit("SAP Ariba", 0.4)]));
        assert_eq!(score.source, ScoreSource::Retrieval);
        assert_eq!(score.value, 40.0);
    }

    #[test]
    fn test_overall_without_solutions() {
        assert_eq!(FitScoreCalculator::new().overall(&[]), (0.0, OverallFit::Low));
    }
}
