//! Token usage and cost per generation stage.

use super::stages::Stage;
use crate::models::ChatModel;
use crate::provider::TokenUsage;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageUsage {
    pub stage: Stage,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// Zero when the model has no known pricing.
    pub cost_usd: f64,
}

/// What one analysis consumed, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLedger {
    pub model: String,
    pub stages: Vec<StageUsage>,
}

impl UsageLedger {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            stages: Vec::new(),
        }
    }

    /// Records and logs one stage's usage, priced with `pricing` if known.
    pub fn record(&mut self, stage: Stage, usage: TokenUsage, pricing: Option<&ChatModel>) {
        let cost_usd = pricing
            .map(|model| model.cost(usage.prompt_tokens, usage.completion_tokens))
            .unwrap_or(0.0);
        info!(
            stage = %stage,
            model = %self.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            cost = %format!("${cost_usd:.4}"),
            "Generation stage usage"
        );
        self.stages.push(StageUsage {
            stage,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cost_usd,
        });
    }

    pub fn total_tokens(&self) -> u32 {
        self.stages.iter().map(|s| s.total_tokens).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.stages.iter().map(|s| s.cost_usd).sum()
    }
}
