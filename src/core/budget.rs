// src/core/budget.rs — Token and cost budget tracking

use crate::provider::TokenUsage;

/// Which ceiling a run has hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetBreach {
    Tokens,
    Cost,
}

/// Accumulates token and cost totals across iterations and evaluates
/// threshold breaches. Ceilings are inclusive: usage >= max triggers a
/// stop. A ceiling of 0 means unlimited.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    tokens_used: u64,
    cost_usd: f64,
    max_tokens: u64,
    max_cost_usd: f64,
}

impl BudgetTracker {
    pub fn new(max_tokens: u64, max_cost_usd: f64) -> Self {
        Self {
            tokens_used: 0,
            cost_usd: 0.0,
            max_tokens,
            max_cost_usd,
        }
    }

    /// Add one iteration's usage and cost to the running totals.
    pub fn record(&mut self, usage: &TokenUsage, cost_usd: f64) {
        self.tokens_used += usage.total() as u64;
        self.cost_usd += cost_usd;
    }

    /// Returns the first breached ceiling, tokens before cost.
    pub fn exceeded(&self) -> Option<BudgetBreach> {
        if self.max_tokens > 0 && self.tokens_used >= self.max_tokens {
            return Some(BudgetBreach::Tokens);
        }
        if self.max_cost_usd > 0.0 && self.cost_usd >= self.max_cost_usd {
            return Some(BudgetBreach::Cost);
        }
        None
    }

    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }

    pub fn cost_usd(&self) -> f64 {
        self.cost_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(input: u32, output: u32) -> TokenUsage {
        TokenUsage {
            input_tokens: input,
            output_tokens: output,
        }
    }

    #[test]
    fn test_new_tracker() {
        let b = BudgetTracker::new(100_000, 2.0);
        assert_eq!(b.tokens_used(), 0);
        assert_eq!(b.cost_usd(), 0.0);
        assert_eq!(b.exceeded(), None);
    }

    #[test]
    fn test_record_accumulates() {
        let mut b = BudgetTracker::new(100_000, 2.0);
        b.record(&usage(100, 50), 0.01);
        b.record(&usage(200, 100), 0.02);
        assert_eq!(b.tokens_used(), 450);
        assert!((b.cost_usd() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_token_ceiling_inclusive() {
        let mut b = BudgetTracker::new(150, 0.0);
        b.record(&usage(100, 49), 0.0);
        assert_eq!(b.exceeded(), None);
        b.record(&usage(1, 0), 0.0);
        // exactly at the ceiling counts as a breach
        assert_eq!(b.exceeded(), Some(BudgetBreach::Tokens));
    }

    #[test]
    fn test_cost_ceiling_inclusive() {
        let mut b = BudgetTracker::new(0, 1.0);
        b.record(&usage(10, 10), 0.5);
        assert_eq!(b.exceeded(), None);
        b.record(&usage(10, 10), 0.5);
        assert_eq!(b.exceeded(), Some(BudgetBreach::Cost));
    }

    #[test]
    fn test_tokens_checked_before_cost() {
        let mut b = BudgetTracker::new(10, 0.1);
        b.record(&usage(10, 10), 5.0);
        assert_eq!(b.exceeded(), Some(BudgetBreach::Tokens));
    }

    #[test]
    fn test_zero_means_unlimited() {
        let mut b = BudgetTracker::new(0, 0.0);
        b.record(&usage(1_000_000, 1_000_000), 1_000.0);
        assert_eq!(b.exceeded(), None);
    }
}
