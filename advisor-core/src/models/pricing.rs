use serde::{Deserialize, Serialize};

/// A generation model and what it charges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModel {
    pub id: String,
    pub name: String,
    /// USD per million prompt tokens.
    pub input_cost_per_mtok: f64,
    /// USD per million completion tokens.
    pub output_cost_per_mtok: f64,
}

impl ChatModel {
    fn new(id: &str, name: &str, input_cost_per_mtok: f64, output_cost_per_mtok: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            input_cost_per_mtok,
            output_cost_per_mtok,
        }
    }

    /// Dollar cost of a single call with the given token counts.
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (prompt_tokens as f64 / 1_000_000.0) * self.input_cost_per_mtok
            + (completion_tokens as f64 / 1_000_000.0) * self.output_cost_per_mtok
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModel {
    /// Identifier sent to the provider API.
    pub id: String,
    pub name: String,
    pub context_length: usize,
    pub embedding_dim: usize,
    pub description: String,
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        EmbeddingModel {
            id: "text-embedding-3-small".to_string(),
            name: "OpenAI text-embedding-3-small".to_string(),
            context_length: 8191,
            embedding_dim: 1536,
            description: "General purpose English embedding model".to_string(),
        }
    }
}

/// Per-token prices for the generation models analyses are run with.
///
/// Providers often answer with a dated snapshot id (`gpt-4o-2024-08-06`),
/// so lookups fall back to the longest known id the name extends.
#[derive(Debug, Clone)]
pub struct PriceList {
    models: Vec<ChatModel>,
}

impl PriceList {
    pub fn new() -> Self {
        Self::with_models(vec![
            ChatModel::new("gpt-4o", "GPT-4o", 5.0, 15.0),
            ChatModel::new("gpt-4o-mini", "GPT-4o mini", 0.15, 0.6),
            ChatModel::new("gpt-4-turbo", "GPT-4 Turbo", 10.0, 30.0),
        ])
    }

    pub fn with_models(models: Vec<ChatModel>) -> Self {
        Self { models }
    }

    pub fn lookup(&self, model_id: &str) -> Option<&ChatModel> {
        let model_id = model_id.trim();
        self.models.iter().find(|m| m.id == model_id).or_else(|| {
            self.models
                .iter()
                .filter(|m| {
                    model_id
                        .strip_prefix(m.id.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
                })
                .max_by_key(|m| m.id.len())
        })
    }
}

impl Default for PriceList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup_and_cost() {
        let prices = PriceList::new();
        let gpt4o = prices.lookup("gpt-4o").unwrap();
        let cost = gpt4o.cost(1_000_000, 100_000);
        assert!((cost - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_ids_resolve_to_closest_model() {
        let prices = PriceList::new();
        assert_eq!(prices.lookup("gpt-4o-2024-08-06").unwrap().id, "gpt-4o");
        assert_eq!(prices.lookup("gpt-4o-mini-2024-07-18").unwrap().id, "gpt-4o-mini");
        assert_eq!(prices.lookup(" gpt-4o-mini ").unwrap().id, "gpt-4o-mini");
    }

    #[test]
    fn test_unknown_models_have_no_price() {
        let prices = PriceList::new();
        assert!(prices.lookup("llama3").is_none());
        assert!(prices.lookup("gpt-4").is_none());
        assert!(prices.lookup("gpt-4omni").is_none());
        assert!(prices.lookup("text-embedding-3-small").is_none());
    }

    #[test]
    fn test_custom_price_list() {
        let prices = PriceList::with_models(vec![ChatModel::new("local", "Local", 0.0, 1.0)]);
        assert_eq!(prices.lookup("local").unwrap().cost(500, 2_000_000), 2.0);
        assert!(prices.lookup("gpt-4o").is_none());
    }
}
