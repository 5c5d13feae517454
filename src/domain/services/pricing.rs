//! Model pricing
//!
//! Cost lookup for executed prompts. Prices are USD per 1K tokens. A model
//! matches an entry by exact name, otherwise by the longest entry name it
//! starts with. No match means no cost, never a zero cost.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-model pricing (USD per 1K tokens).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelPricing {
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

const DEFAULT_PRICING: &[(&str, ModelPricing)] = &[
    ("gpt-4", ModelPricing::new(0.03, 0.06)),
    ("gpt-4-turbo", ModelPricing::new(0.01, 0.03)),
    ("gpt-4o", ModelPricing::new(0.005, 0.015)),
    ("gpt-4o-mini", ModelPricing::new(0.00015, 0.0006)),
    ("gpt-3.5-turbo", ModelPricing::new(0.0015, 0.002)),
    ("claude-3-opus", ModelPricing::new(0.015, 0.075)),
    ("claude-3-sonnet", ModelPricing::new(0.003, 0.015)),
    ("claude-3-haiku", ModelPricing::new(0.00025, 0.00125)),
    ("claude-3-5-sonnet", ModelPricing::new(0.003, 0.015)),
];

#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    entries: IndexMap<String, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PRICING
                .iter()
                .map(|(name, pricing)| (name.to_string(), *pricing))
                .collect(),
        }
    }
}

impl PricingTable {
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.insert(model, pricing);
        self
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.entries.insert(model.into(), pricing);
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Exact match first, then the longest entry that prefixes `model`.
    /// A `provider/` qualifier (e.g. `openai/gpt-4o`) is ignored when the
    /// full name has no match.
    pub fn lookup(&self, model: &str) -> Option<&ModelPricing> {
        self.lookup_name(model).or_else(|| {
            let (_, bare) = model.rsplit_once('/')?;
            self.lookup_name(bare)
        })
    }

    fn lookup_name(&self, model: &str) -> Option<&ModelPricing> {
        if let Some(pricing) = self.entries.get(model) {
            return Some(pricing);
        }
        self.entries
            .iter()
            .filter(|(name, _)| model.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, pricing)| pricing)
    }

    /// `None` when either token count is missing or the model is unknown.
    pub fn estimate_cost(
        &self,
        model: &str,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
    ) -> Option<f64> {
        let (input, output) = (input_tokens?, output_tokens?);
        self.lookup(model)
            .map(|pricing| pricing.estimate_cost(input, output))
    }
}
