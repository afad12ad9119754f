//! Weighted heuristic scorer
//!
//! Each rule fires independently and contributes a score delta plus an
//! explanation. Explanation weights are normalized over the fired rules so
//! they sum to 1. This tier has no external dependency and cannot fail.

use tracing::debug;

use crate::classifier::{Feature, FeatureVector};
use crate::models::{ClassProbabilities, FactorExplanation, Provenance, RiskTier, ScoreResult};

use super::{neutral_result, MAX_RISK};

/// Cap applied to the synthesized behavior score before thresholds.
const BEHAVIOR_SCORE_CAP: f64 = 100.0;

/// Importance of the fallback factor when no rule fires.
const BASELINE_IMPORTANCE: f64 = 0.3;

/// A fired rule before weight normalization.
#[derive(Debug, Clone)]
struct FiredRule {
    name: &'static str,
    delta: f64,
    weight: f64,
    display: String,
    rationale: &'static str,
}

impl FiredRule {
    /// Rule whose explanation weight equals its score delta.
    fn scored(name: &'static str, delta: f64, display: String, rationale: &'static str) -> Self {
        Self {
            name,
            delta,
            weight: delta,
            display,
            rationale,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScorer;

impl RuleScorer {
    pub fn new() -> Self {
        Self
    }

    fn fire(&self, fv: &FeatureVector) -> Vec<FiredRule> {
        let mut fired = Vec::new();

        let total = fv.get(Feature::TotalPermissions);
        let dangerous = fv.get(Feature::DangerousPermissions);
        if total > 0.0 {
            let ratio = fv.get(Feature::PermissionRatio);
            let display = format!("{:.1}% ({dangerous}/{total})", ratio * 100.0);
            if ratio > 0.5 {
                fired.push(FiredRule::scored(
                    "High Dangerous Permission Ratio",
                    2.5,
                    display,
                    "High ratio of dangerous to total permissions",
                ));
            } else if ratio > 0.3 {
                fired.push(FiredRule::scored(
                    "Moderate Permission Risk",
                    1.5,
                    display,
                    "Moderate ratio of dangerous permissions",
                ));
            }
        }

        if fv.flag(Feature::IsSelfSigned) {
            fired.push(FiredRule::scored(
                "Self-Signed Certificate",
                1.5,
                "Yes".into(),
                "App uses a self-signed certificate instead of a trusted CA",
            ));
        }
        if !fv.flag(Feature::CertValid) {
            fired.push(FiredRule::scored(
                "Invalid Certificate",
                2.0,
                "Expired/Invalid".into(),
                "Certificate is expired or invalid",
            ));
        }

        let behavior = fv.get(Feature::MaliciousBehaviorScore).min(BEHAVIOR_SCORE_CAP);
        if behavior > 50.0 {
            fired.push(FiredRule::scored(
                "High Malicious Behavior Score",
                2.5,
                format!("{behavior:.1}"),
                "High synthesized malicious behavior score",
            ));
        } else if behavior > 25.0 {
            fired.push(FiredRule::scored(
                "Moderate Malicious Behavior Score",
                1.5,
                format!("{behavior:.1}"),
                "Moderate synthesized malicious behavior score",
            ));
        }

        if fv.flag(Feature::HasBankingKeywords) {
            fired.push(FiredRule::scored(
                "Banking Keywords Detected",
                1.0,
                "Yes".into(),
                "App contains banking-related keywords",
            ));
        }

        // Banking-trojan signatures
        if fv.flag(Feature::HasSystemAlertWindow) && fv.flag(Feature::HasBindAccessibilityService) {
            fired.push(FiredRule {
                name: "Critical Permission Combo",
                delta: 4.0,
                weight: 0.95,
                display: "Overlay + Accessibility".into(),
                rationale: "Can display fake interfaces and capture user input",
            });
        }
        let sms = [Feature::HasReadSms, Feature::HasSendSms, Feature::HasReceiveSms]
            .into_iter()
            .filter(|f| fv.flag(*f))
            .count();
        if fv.flag(Feature::HasBindDeviceAdmin) && sms >= 2 {
            fired.push(FiredRule {
                name: "Admin + SMS Control",
                delta: 3.5,
                weight: 0.9,
                display: format!("Admin + {sms} SMS permissions"),
                rationale: "Can control the device and intercept SMS",
            });
        }

        fired
    }

    fn baseline(fv: &FeatureVector) -> FactorExplanation {
        FactorExplanation::new(
            "Basic App Analysis",
            BASELINE_IMPORTANCE,
            format!("{} total permissions", fv.get(Feature::TotalPermissions)),
            "No specific risk factors triggered",
        )
    }

    fn explanations(fv: &FeatureVector, fired: &[FiredRule]) -> Vec<FactorExplanation> {
        let total_weight: f64 = fired.iter().map(|r| r.weight).sum();
        if fired.is_empty() || total_weight <= 0.0 {
            return vec![Self::baseline(fv)];
        }
        fired
            .iter()
            .map(|r| {
                FactorExplanation::new(
                    r.name,
                    (r.weight / total_weight).clamp(0.0, 1.0),
                    r.display.clone(),
                    r.rationale,
                )
            })
            .collect()
    }

    /// Rule explanations alone, used to explain scores from models that
    /// expose no importance accessor.
    pub fn explain(&self, fv: &FeatureVector) -> Vec<FactorExplanation> {
        Self::explanations(fv, &self.fire(fv))
    }

    pub fn score(&self, fv: &FeatureVector) -> ScoreResult {
        let fired = self.fire(fv);
        let raw: f64 = fired.iter().map(|r| r.delta).sum();
        if !raw.is_finite() {
            return neutral_result();
        }

        let risk_score = raw.clamp(0.0, MAX_RISK);
        let confidence = if fired.is_empty() {
            0.5
        } else {
            (0.3 + 0.15 * fired.len() as f64).min(0.95)
        };
        debug!(raw, risk_score, rules = fired.len(), "rule scorer");

        ScoreResult {
            risk_score,
            confidence,
            probabilities: ClassProbabilities::from_malicious(risk_score / MAX_RISK),
            explanations: Self::explanations(fv, &fired),
            provenance: Provenance::Rule,
            rule_tier: Some(RiskTier::from_score(raw)),
        }
    }
}
