//! Tiered scoring with fallback
//!
//! Strategies are tried in order. A strategy that is not usable, fails,
//! overruns the time budget, or violates the output contract is skipped
//! with a `warn!`. If every strategy is skipped the neutral result is
//! returned, so [`ScoringOrchestrator::score`] never fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::classifier::{FeatureVector, RiskModel};
use crate::models::ScoreResult;

use super::{
    check_invariants, neutral_result, sanitize_result, ModelScorer, RuleScorer, ScoreUnavailable,
};

/// One scoring tier.
pub enum ScoringStrategy {
    Model(ModelScorer),
    Rule(RuleScorer),
}

impl ScoringStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ScoringStrategy::Model(_) => "model",
            ScoringStrategy::Rule(_) => "rule",
        }
    }

    pub fn is_usable(&self, fv: &FeatureVector) -> Result<(), ScoreUnavailable> {
        match self {
            ScoringStrategy::Model(scorer) => scorer.is_usable(fv),
            ScoringStrategy::Rule(_) => Ok(()),
        }
    }

    pub fn attempt_score(&self, fv: &FeatureVector) -> Result<ScoreResult, ScoreUnavailable> {
        match self {
            ScoringStrategy::Model(scorer) => scorer.score(fv),
            ScoringStrategy::Rule(scorer) => Ok(scorer.score(fv)),
        }
    }

    /// Only the model tier is held to the time budget; the rule tier is the
    /// floor every request can rely on.
    fn is_budgeted(&self) -> bool {
        matches!(self, ScoringStrategy::Model(_))
    }
}

pub struct ScoringOrchestrator {
    strategies: Vec<ScoringStrategy>,
    budget: Option<Duration>,
}

impl ScoringOrchestrator {
    /// Model tier (when a model is given) followed by the rule tier.
    pub fn new(model: Option<Arc<dyn RiskModel>>) -> Self {
        let mut strategies = Vec::with_capacity(2);
        match model {
            Some(model) => strategies.push(ScoringStrategy::Model(ModelScorer::new(model))),
            None => debug!(reason = %ScoreUnavailable::NoModel, "model tier disabled"),
        }
        strategies.push(ScoringStrategy::Rule(RuleScorer::new()));
        Self::with_strategies(strategies)
    }

    pub fn with_strategies(strategies: Vec<ScoringStrategy>) -> Self {
        Self {
            strategies,
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn has_model(&self) -> bool {
        self.strategies
            .iter()
            .any(|s| matches!(s, ScoringStrategy::Model(_)))
    }

    pub fn strategies(&self) -> &[ScoringStrategy] {
        &self.strategies
    }

    fn run(&self, strategy: &ScoringStrategy, fv: &FeatureVector) -> Result<ScoreResult, ScoreUnavailable> {
        strategy.is_usable(fv)?;

        let start = Instant::now();
        let result = strategy.attempt_score(fv)?;
        let elapsed = start.elapsed();

        if let Some(budget) = self.budget.filter(|_| strategy.is_budgeted()) {
            if elapsed > budget {
                return Err(ScoreUnavailable::BudgetExceeded {
                    elapsed_ms: elapsed.as_millis(),
                    budget_ms: budget.as_millis(),
                });
            }
        }

        let result = sanitize_result(result);
        check_invariants(&result)?;
        Ok(result)
    }

    pub fn score(&self, fv: &FeatureVector) -> ScoreResult {
        for strategy in &self.strategies {
            match self.run(strategy, fv) {
                Ok(result) => {
                    debug!(tier = strategy.name(), risk = result.risk_score, "scored");
                    return result;
                }
                Err(reason) => {
                    warn!(tier = strategy.name(), %reason, "scoring tier failed, falling back");
                }
            }
        }
        warn!("all scoring tiers failed; using neutral defaults");
        neutral_result()
    }
}

impl Default for ScoringOrchestrator {
    fn default() -> Self {
        Self::new(None)
    }
}
