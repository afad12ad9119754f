//! Layered risk scoring
//!
//! A [`FeatureVector`](crate::classifier::FeatureVector) is scored by the
//! first usable tier of:
//!
//! ```text
//! 1. Model scorer   risk = 10 × P(malicious), confidence = max class probability
//! 2. Rule scorer    risk = clamp(Σ triggered deltas, 0, 10), P(malicious) = risk / 10
//! 3. Neutral        risk = 5.0, confidence = 0.5, probabilities 0.5 / 0.5
//! ```
//!
//! Every tier output crosses [`sanitize_result`] and [`check_invariants`]
//! before it is accepted, so callers always see finite numbers and class
//! probabilities summing to 1.

mod model_scorer;
mod orchestrator;
mod rules;

pub use model_scorer::ModelScorer;
pub use orchestrator::{ScoringOrchestrator, ScoringStrategy};
pub use rules::RuleScorer;

use thiserror::Error;
use tracing::debug;

use crate::models::{ClassProbabilities, FactorExplanation, Provenance, ScoreResult};

/// Upper bound of every risk score.
pub const MAX_RISK: f64 = 10.0;
pub const NEUTRAL_RISK: f64 = 5.0;
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;
/// Allowed drift of `safe + malicious` from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Why a scoring tier did not produce the result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreUnavailable {
    #[error("no model loaded")]
    NoModel,

    #[error("feature contract mismatch: {0}")]
    ContractMismatch(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("tier took {elapsed_ms}ms, budget is {budget_ms}ms")]
    BudgetExceeded { elapsed_ms: u128, budget_ms: u128 },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Terminal result used when no tier could score.
pub fn neutral_result() -> ScoreResult {
    ScoreResult {
        risk_score: NEUTRAL_RISK,
        confidence: NEUTRAL_CONFIDENCE,
        probabilities: ClassProbabilities::NEUTRAL,
        explanations: vec![FactorExplanation::new(
            "Basic App Analysis",
            0.3,
            "Insufficient signal",
            "No scoring tier produced a result; neutral defaults applied",
        )],
        provenance: Provenance::Default,
        rule_tier: None,
    }
}

/// Replace non-finite probabilities with 50/50 and rescale to sum to 1.
pub fn normalize_probabilities(p: ClassProbabilities) -> ClassProbabilities {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if !valid(p.safe) || !valid(p.malicious) {
        debug!(safe = p.safe, malicious = p.malicious, "non-finite probabilities replaced");
        return ClassProbabilities::NEUTRAL;
    }
    let sum = p.safe + p.malicious;
    if sum <= 0.0 {
        return ClassProbabilities::NEUTRAL;
    }
    let malicious = (p.malicious / sum).clamp(0.0, 1.0);
    ClassProbabilities {
        safe: 1.0 - malicious,
        malicious,
    }
}

/// Clamp an importance into `[0, 1]`, mapping non-finite values to 0.
pub fn sanitize_importance(importance: f64) -> f64 {
    if importance.is_finite() {
        importance.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Coerce every numeric field of a tier output into its valid range.
pub fn sanitize_result(mut result: ScoreResult) -> ScoreResult {
    if !result.risk_score.is_finite() {
        debug!(raw = result.risk_score, "non-finite risk score replaced");
        result.risk_score = NEUTRAL_RISK;
    }
    result.risk_score = result.risk_score.clamp(0.0, MAX_RISK);

    if !result.confidence.is_finite() {
        debug!(raw = result.confidence, "non-finite confidence replaced");
        result.confidence = NEUTRAL_CONFIDENCE;
    }
    result.confidence = result.confidence.clamp(0.0, 1.0);

    result.probabilities = normalize_probabilities(result.probabilities);

    for factor in &mut result.explanations {
        factor.importance = sanitize_importance(factor.importance);
    }
    result
}

/// Verify the output contract of a scoring tier.
pub fn check_invariants(result: &ScoreResult) -> Result<(), ScoreUnavailable> {
    let violation = |msg: String| Err(ScoreUnavailable::InvariantViolation(msg));

    if !result.risk_score.is_finite() || !(0.0..=MAX_RISK).contains(&result.risk_score) {
        return violation(format!("risk score {} outside [0, 10]", result.risk_score));
    }
    if !result.confidence.is_finite() || !(0.0..=1.0).contains(&result.confidence) {
        return violation(format!("confidence {} outside [0, 1]", result.confidence));
    }
    let p = result.probabilities;
    if !p.safe.is_finite() || !p.malicious.is_finite() {
        return violation("non-finite class probability".into());
    }
    if (p.safe + p.malicious - 1.0).abs() > PROBABILITY_TOLERANCE {
        return violation(format!(
            "probabilities sum to {}",
            p.safe + p.malicious
        ));
    }
    if let Some(bad) = result
        .explanations
        .iter()
        .find(|f| !f.importance.is_finite() || !(0.0..=1.0).contains(&f.importance))
    {
        return violation(format!("importance {} for '{}'", bad.importance, bad.name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(risk: f64, confidence: f64, safe: f64, malicious: f64) -> ScoreResult {
        ScoreResult {
            risk_score: risk,
            confidence,
            probabilities: ClassProbabilities { safe, malicious },
            explanations: vec![FactorExplanation::new("x", f64::NAN, "", "")],
            provenance: Provenance::Model,
            rule_tier: None,
        }
    }

    #[test]
    fn test_neutral_result_is_valid() {
        let neutral = neutral_result();
        assert!(check_invariants(&neutral).is_ok());
        assert!(!neutral.explanations.is_empty());
        assert_eq!(neutral.provenance, Provenance::Default);
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let clean = sanitize_result(result(f64::NAN, f64::INFINITY, f64::NAN, 0.3));
        assert_eq!(clean.risk_score, NEUTRAL_RISK);
        assert_eq!(clean.confidence, NEUTRAL_CONFIDENCE);
        assert_eq!(clean.probabilities, ClassProbabilities::NEUTRAL);
        assert_eq!(clean.explanations[0].importance, 0.0);
        assert!(check_invariants(&clean).is_ok());
    }

    #[test]
    fn test_sanitize_clamps_and_renormalizes() {
        let clean = sanitize_result(result(14.0, 1.2, 0.3, 0.9));
        assert_eq!(clean.risk_score, MAX_RISK);
        assert_eq!(clean.confidence, 1.0);
        assert!((clean.probabilities.malicious - 0.75).abs() < 1e-12);
        assert!((clean.probabilities.safe + clean.probabilities.malicious - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_probabilities_become_neutral() {
        let p = normalize_probabilities(ClassProbabilities {
            safe: 0.0,
            malicious: 0.0,
        });
        assert_eq!(p, ClassProbabilities::NEUTRAL);
    }

    #[test]
    fn test_check_invariants_flags_bad_sum() {
        let mut r = neutral_result();
        r.probabilities = ClassProbabilities {
            safe: 0.7,
            malicious: 0.7,
        };
        assert!(matches!(
            check_invariants(&r),
            Err(ScoreUnavailable::InvariantViolation(_))
        ));
    }
}
