//! Runs the three generation stages for one company.

use super::drafts::NarrativeDraft;
use super::fit_score::FitScoreCalculator;
use super::normalizer::{GeneratedAnalysis, ResultNormalizer};
use super::prompts;
use super::stages::{ChallengesOutput, NarrativeInput, SolutionsOutput, Stage};
use super::types::AnalysisResult;
use super::usage::UsageLedger;
use super::{AnalysisError, Result};
use crate::config::{Config, GenerationConfig, LlmConfig};
use crate::knowledge::{seed, CompanyContext, ContextBundle};
use crate::models::{ChatModel, PriceList};
use crate::provider::{CompletionRequest, Provider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Drives solutions → challenges → narrative, then scores and normalizes.
///
/// Stages run one after another and are never retried; the first failure
/// ends the analysis.
///
/// ```text
/// context ─┬─> solutions ──┬─> narrative ─> rank ─> normalize
///          └─> challenges ─┘
/// ```
pub struct AnalysisOrchestrator {
    provider: Arc<dyn Provider>,
    llm: LlmConfig,
    generation: GenerationConfig,
    pricing: Option<ChatModel>,
    calculator: FitScoreCalculator,
    normalizer: ResultNormalizer,
}

impl AnalysisOrchestrator {
    pub fn new(provider: Arc<dyn Provider>, config: &Config) -> Self {
        let pricing = PriceList::new().lookup(&config.llm.model).cloned();
        if pricing.is_none() {
            debug!(model = %config.llm.model, "No pricing known for model; costs will read as zero");
        }
        Self {
            provider,
            llm: config.llm.clone(),
            generation: config.generation.clone(),
            pricing,
            calculator: FitScoreCalculator::new(),
            normalizer: ResultNormalizer::new(
                config.generation.vendor_name.clone(),
                config.generation.format_min_chars,
            ),
        }
    }

    /// Generates the analysis for `company` from an already retrieved
    /// context. An empty bundle is valid and yields an analysis without
    /// catalog grounding.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Provider`] if a completion call fails
    /// - [`AnalysisError::MalformedGeneration`] if a stage's output does not
    ///   parse or validate
    pub async fn generate(&self, company: &CompanyContext, bundle: &ContextBundle) -> Result<AnalysisResult> {
        let started = Instant::now();
        let vendor = self.generation.vendor_name.as_str();
        let context = prompts::context_prompt(company, bundle, vendor);
        let catalog = bundle.product_names();
        let mut usage = UsageLedger::new(self.llm.model.clone());

        let raw = self
            .run(
                Stage::Solutions,
                prompts::solutions_prompt(&context, &catalog, vendor),
                self.generation.solutions_max_tokens,
                &mut usage,
            )
            .await?;
        let solutions = SolutionsOutput::parse(&raw, &catalog)?;

        let raw = self
            .run(
                Stage::Challenges,
                prompts::challenges_prompt(&context, vendor, self.generation.challenge_min_chars),
                self.generation.challenges_max_tokens,
                &mut usage,
            )
            .await?;
        let challenges = ChallengesOutput::parse(&raw, vendor, self.generation.challenge_min_chars)?
            .pad_from(&seed::default_challenges(&company.industry), &company.industry);

        let input = NarrativeInput::new(&solutions, &challenges);
        let raw = self
            .run(
                Stage::Narrative,
                prompts::narrative_prompt(&context, &input, vendor, &self.generation.narrative_min_chars),
                self.generation.narrative_max_tokens,
                &mut usage,
            )
            .await?;
        let narrative = NarrativeDraft::parse(&raw, &self.generation.narrative_min_chars)?;

        let ranked = self.calculator.rank(solutions.into_solutions(), bundle);
        let (fit_score, overall_fit) = self.calculator.overall(&ranked);

        info!(
            company = %company.name,
            solutions = ranked.len(),
            fit_score,
            overall_fit = %overall_fit,
            total_tokens = usage.total_tokens(),
            cost = %format!("${:.4}", usage.total_cost()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated analysis"
        );

        let generated = GeneratedAnalysis {
            ranked,
            fit_score,
            overall_fit,
            challenges: challenges.into_challenges(),
            narrative,
        };
        Ok(self.normalizer.normalize(company, bundle, generated, usage))
    }

    async fn run(&self, stage: Stage, prompt: String, max_tokens: u32, usage: &mut UsageLedger) -> Result<String> {
        debug!(stage = %stage, prompt_chars = prompt.len(), max_tokens, "Running generation stage");
        let request = CompletionRequest::new(self.llm.model.clone(), prompt)
            .with_temperature(self.llm.temperature)
            .with_max_tokens(max_tokens);

        let completion = self
            .provider
            .complete(request)
            .await
            .map_err(|source| AnalysisError::Provider { stage, source })?;
        usage.record(stage, completion.usage, self.pricing.as_ref());
        Ok(completion.text)
    }
}
