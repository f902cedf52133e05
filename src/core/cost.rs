// src/core/cost.rs — Cost estimation

use crate::provider::{ModelProvider, TokenUsage};

/// Estimate cost in USD for one call: `tokens / 1M × price-per-Mtok`,
/// per direction. This is the entire formula; it is deliberately explicit
/// rather than inferred from provider billing pages at runtime.
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    apply_pricing(model_pricing(model), usage)
}

/// Like `estimate_cost`, but the provider's own model catalog takes
/// precedence; models the provider does not list fall back to the static
/// table. The catalog is the single source of prices for catalogued models.
pub fn estimate_cost_for(provider: &dyn ModelProvider, model: &str, usage: &TokenUsage) -> f64 {
    let prices = provider
        .models()
        .into_iter()
        .find(|m| m.id == model)
        .map(|m| (m.input_price_per_mtok, m.output_price_per_mtok))
        .unwrap_or_else(|| model_pricing(model));
    apply_pricing(prices, usage)
}

fn apply_pricing((input_price, output_price): (f64, f64), usage: &TokenUsage) -> f64 {
    let input_cost = (usage.input_tokens as f64 / 1_000_000.0) * input_price;
    let output_cost = (usage.output_tokens as f64 / 1_000_000.0) * output_price;
    input_cost + output_cost
}

/// Returns (input_price_per_mtok, output_price_per_mtok).
pub fn model_pricing(model: &str) -> (f64, f64) {
    match model {
        // Anthropic
        m if m.contains("claude-opus") => (15.0, 75.0),
        m if m.contains("claude-sonnet") => (3.0, 15.0),
        m if m.contains("claude-haiku") || m.contains("haiku") => (0.8, 4.0),

        // OpenAI
        m if m.contains("gpt-4.1-mini") => (0.4, 1.6),
        m if m.contains("gpt-4.1") => (2.0, 8.0),
        m if m.contains("gpt-4o-mini") => (0.15, 0.6),
        m if m.contains("gpt-4o") => (2.5, 10.0),
        m if m.contains("o3-mini") => (1.1, 4.4),

        // Local / self-hosted (free)
        m if m.contains("llama") || m.contains("qwen") || m.contains("deepseek") => (0.0, 0.0),

        // Default: assume moderate pricing
        _ => (1.0, 3.0),
    }
}
