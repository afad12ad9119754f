//! Post-hoc adjustment and verdict
//!
//! Configurable boosts are added on top of the scorer's risk, each one
//! independently triggered, then the total is clamped to `[0, 10]` and
//! mapped to a [`Verdict`].

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classifier::permissions::{self, declares};
use crate::classifier::SyntheticTelemetry;
use crate::config::AdjustmentWeights;
use crate::models::{AppliedAdjustment, FinalAssessment, RawFacts, ScoreResult, Verdict};
use crate::scoring::{sanitize_result, MAX_RISK};

use super::explain::explain;
use super::summary::summarize;

/// Boosts that fire for `raw`, with non-finite or negative weights ignored.
pub fn applicable_adjustments(
    raw: &RawFacts,
    weights: &AdjustmentWeights,
    now: DateTime<Utc>,
) -> Vec<AppliedAdjustment> {
    let mut applied = Vec::new();
    let mut push = |rule: &str, weight: f64| {
        if weight.is_finite() && weight > 0.0 {
            applied.push(AppliedAdjustment {
                rule: rule.to_string(),
                weight,
            });
        }
    };

    if declares(&raw.permissions, permissions::OVERLAY)
        && declares(&raw.permissions, permissions::ACCESSIBILITY)
    {
        push("overlay_accessibility", weights.overlay_accessibility);
    }
    if !raw.suspicious_strings.is_empty() {
        push("suspicious_strings", weights.suspicious_strings);
    }
    if raw.certificate_self_signed() || !raw.certificate_valid_at(now) {
        push("invalid_certificate", weights.invalid_certificate);
    }
    applied
}

pub fn adjust(score: &ScoreResult, raw: &RawFacts, weights: &AdjustmentWeights) -> FinalAssessment {
    adjust_at(score, raw, weights, Utc::now())
}

pub fn adjust_at(
    score: &ScoreResult,
    raw: &RawFacts,
    weights: &AdjustmentWeights,
    now: DateTime<Utc>,
) -> FinalAssessment {
    let base = sanitize_result(score.clone());
    let adjustments = applicable_adjustments(raw, weights, now);
    let boost: f64 = adjustments.iter().map(|a| a.weight).sum();
    let risk_score = (base.risk_score + boost).clamp(0.0, MAX_RISK);

    for a in &adjustments {
        debug!(rule = %a.rule, weight = a.weight, "adjustment applied");
    }

    FinalAssessment {
        risk_score,
        verdict: Verdict::from_score(risk_score),
        rule_tier: base.rule_tier,
        base_score: base.risk_score,
        confidence: base.confidence,
        probabilities: base.probabilities,
        provenance: base.provenance,
        top_factors: explain(&base),
        adjustments,
        package: summarize(raw, now),
        synthetic_telemetry: SyntheticTelemetry::from_facts(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CertificateInfo, ClassProbabilities, Provenance};
    use crate::scoring::neutral_result;

    fn base(risk: f64) -> ScoreResult {
        ScoreResult {
            risk_score: risk,
            confidence: 0.7,
            probabilities: ClassProbabilities::from_malicious(risk / 10.0),
            explanations: Vec::new(),
            provenance: Provenance::Rule,
            rule_tier: None,
        }
    }

    fn clean_facts() -> RawFacts {
        RawFacts {
            certificate: Some(CertificateInfo {
                issuer: Some("CN=CA".into()),
                subject: Some("CN=App".into()),
                is_valid: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_boosts_for_clean_facts() {
        let out = adjust(&base(1.0), &clean_facts(), &AdjustmentWeights::default());
        assert!(out.adjustments.is_empty());
        assert_eq!(out.risk_score, 1.0);
        assert_eq!(out.verdict, Verdict::Safe);
        assert_eq!(out.top_factors[0].name, "Basic App Analysis");
    }

    #[test]
    fn test_all_boosts_and_clamp() {
        let raw = RawFacts {
            permissions: vec!["SYSTEM_ALERT_WINDOW".into(), "BIND_ACCESSIBILITY_SERVICE".into()],
            suspicious_strings: vec!["http://1.2.3.4/x".into()],
            ..Default::default()
        };
        let out = adjust(&base(6.0), &raw, &AdjustmentWeights::default());
        let rules: Vec<&str> = out.adjustments.iter().map(|a| a.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec!["overlay_accessibility", "suspicious_strings", "invalid_certificate"]
        );
        assert_eq!(out.risk_score, 10.0);
        assert_eq!(out.base_score, 6.0);
        assert_eq!(out.verdict, Verdict::HighRisk);
    }

    #[test]
    fn test_custom_weights() {
        let mut raw = clean_facts();
        raw.suspicious_strings.push("evil".into());
        let weights = AdjustmentWeights {
            suspicious_strings: 0.5,
            ..Default::default()
        };
        let out = adjust(&base(2.0), &raw, &weights);
        assert!((out.risk_score - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_ignored() {
        let mut raw = clean_facts();
        raw.suspicious_strings.push("evil".into());
        let weights = AdjustmentWeights {
            suspicious_strings: f64::NAN,
            ..Default::default()
        };
        let out = adjust(&base(2.0), &raw, &weights);
        assert_eq!(out.risk_score, 2.0);
        assert!(out.adjustments.is_empty());
    }

    #[test]
    fn test_non_finite_base_is_sanitized() {
        let out = adjust(&base(f64::NAN), &clean_facts(), &AdjustmentWeights::default());
        assert_eq!(out.risk_score, 5.0);
        assert_eq!(out.verdict, Verdict::Suspicious);
    }

    #[test]
    fn test_carries_provenance_and_telemetry() {
        let out = adjust(&neutral_result(), &clean_facts(), &AdjustmentWeights::default());
        assert_eq!(out.provenance, Provenance::Default);
        assert!(out.synthetic_telemetry.synthesized);
    }
}
