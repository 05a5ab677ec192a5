//! Analysis generation: from a company and its retrieved context to a
//! scored, normalized solution recommendation.
//!
//! # Architecture
//!
//! - [`AnalysisOrchestrator`]: runs the solutions, challenges and narrative
//!   stages against a [`Provider`](crate::provider::Provider)
//! - [`SolutionsOutput`], [`ChallengesOutput`], [`NarrativeDraft`]: each
//!   stage's raw text, parsed and validated
//! - [`FitScoreCalculator`]: scores and ranks the recommended solutions
//! - [`ResultNormalizer`]: fills every gap the generator left

mod drafts;
mod fit_score;
mod lenient;
mod narrative;
mod normalizer;
mod orchestrator;
mod prompts;
mod stages;
mod types;
mod usage;

pub use drafts::{
    BusinessCaseDraft, ChallengeFields, CompetitiveAnalysisDraft, FinancialAnalysisDraft,
    NarrativeDraft, RoadmapPhaseDraft, SolutionDraft,
};
pub use fit_score::{normalize_product_name, FitScore, FitScoreCalculator, ScoredSolution};
pub use normalizer::{fill_business_case_fallbacks, net_present_value, ResultNormalizer};
pub use orchestrator::AnalysisOrchestrator;
pub use stages::{ChallengesOutput, NarrativeInput, SolutionsOutput, Stage};
pub use types::{
    AnalysisResult, BusinessCase, CompetitiveAnalysis, FinancialAnalysis, OverallFit,
    RecommendedSolution, RoadmapPhase, ScoreSource,
};
pub use usage::{StageUsage, UsageLedger};

use crate::knowledge::KnowledgeError;
use crate::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Context retrieval failed: {0}")]
    Retrieval(#[from] KnowledgeError),

    #[error("{stage} stage failed: {source}")]
    Provider {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    /// A stage returned text that did not parse or validate. `raw` is the
    /// text exactly as generated.
    #[error("{stage} stage returned malformed output: {reason}")]
    MalformedGeneration {
        stage: Stage,
        reason: String,
        raw: String,
    },
}

impl AnalysisError {
    pub(crate) fn malformed(stage: Stage, reason: impl Into<String>, raw: &str) -> Self {
        AnalysisError::MalformedGeneration {
            stage,
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// Whether a backend failed, as opposed to the generator misbehaving or
    /// the caller asking for something missing.
    pub fn is_provider_unavailable(&self) -> bool {
        match self {
            AnalysisError::Retrieval(err) => err.is_provider_unavailable(),
            AnalysisError::Provider { source, .. } => {
                !matches!(source, ProviderError::MissingApiKey(_))
            }
            AnalysisError::MalformedGeneration { .. } => false,
        }
    }

    /// The generation stage that failed, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AnalysisError::Retrieval(_) => None,
            AnalysisError::Provider { stage, .. } | AnalysisError::MalformedGeneration { stage, .. } => {
                Some(*stage)
            }
        }
    }

    /// The raw generated text behind a [`AnalysisError::MalformedGeneration`].
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            AnalysisError::MalformedGeneration { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
