//! End-to-end assessment pipeline
//!
//! Orchestrates one assessment:
//! 1. Normalize raw package facts into the fixed feature schema
//! 2. Score with the first usable tier (model, rules, neutral)
//! 3. Apply post-hoc boosts and derive the verdict
//! 4. Rank explanations and attach the display summary
//!
//! The pipeline is immutable after construction and `Sync`, so a single
//! instance serves any number of concurrent assessments.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::assessment::{adjust_at, compare};
use crate::classifier::{load_model, normalize_at, RiskModel};
use crate::config::{AdjustmentWeights, AssessmentConfig};
use crate::models::{ComparisonResult, FinalAssessment, RawFacts};
use crate::scoring::ScoringOrchestrator;

pub struct AssessmentPipeline {
    orchestrator: ScoringOrchestrator,
    weights: AdjustmentWeights,
}

impl AssessmentPipeline {
    pub fn new(model: Option<Arc<dyn RiskModel>>, weights: AdjustmentWeights) -> Self {
        Self {
            orchestrator: ScoringOrchestrator::new(model),
            weights,
        }
    }

    /// Rule-only pipeline with default weights.
    pub fn rules_only() -> Self {
        Self::new(None, AdjustmentWeights::default())
    }

    /// Build from resolved configuration, loading the model once.
    ///
    /// A model that fails to load disables the model tier with a warning.
    pub fn from_config(config: &AssessmentConfig) -> Self {
        let model = config.model.path.as_deref().and_then(try_load_model);
        Self::new(model, config.adjustments).with_budget(config.scoring.budget())
    }

    pub fn with_budget(mut self, budget: Option<std::time::Duration>) -> Self {
        self.orchestrator = self.orchestrator.with_budget(budget);
        self
    }

    pub fn has_model(&self) -> bool {
        self.orchestrator.has_model()
    }

    pub fn weights(&self) -> &AdjustmentWeights {
        &self.weights
    }

    pub fn assess(&self, raw: &RawFacts) -> FinalAssessment {
        self.assess_at(raw, Utc::now())
    }

    /// Assess with certificate validity evaluated at `now`.
    pub fn assess_at(&self, raw: &RawFacts, now: DateTime<Utc>) -> FinalAssessment {
        let features = normalize_at(raw, now);
        let score = self.orchestrator.score(&features);
        adjust_at(&score, raw, &self.weights, now)
    }

    /// Assess many packages in parallel; output order matches input order.
    pub fn assess_batch(&self, batch: &[RawFacts]) -> Vec<FinalAssessment> {
        let now = Utc::now();
        let results: Vec<FinalAssessment> =
            batch.par_iter().map(|raw| self.assess_at(raw, now)).collect();
        info!(count = results.len(), "Batch assessment complete");
        results
    }

    pub fn compare_facts(&self, a: &RawFacts, b: &RawFacts) -> ComparisonResult {
        let now = Utc::now();
        compare(&self.assess_at(a, now), &self.assess_at(b, now))
    }
}

impl Default for AssessmentPipeline {
    fn default() -> Self {
        Self::rules_only()
    }
}

fn try_load_model(path: &Path) -> Option<Arc<dyn RiskModel>> {
    match load_model(path) {
        Ok(model) => Some(model),
        Err(e) => {
            warn!("Model tier disabled: {e}");
            None
        }
    }
}
