//! Probability-based scorer backed by a trained model

use std::sync::Arc;

use tracing::debug;

use crate::classifier::{Feature, FeatureVector, RiskModel};
use crate::models::{ClassProbabilities, FactorExplanation, Provenance, ScoreResult};

use super::{normalize_probabilities, RuleScorer, ScoreUnavailable, MAX_RISK};

/// Number of model features surfaced as explanations.
const TOP_IMPORTANCES: usize = 5;

pub struct ModelScorer {
    model: Arc<dyn RiskModel>,
    rules: RuleScorer,
}

impl ModelScorer {
    pub fn new(model: Arc<dyn RiskModel>) -> Self {
        Self {
            model,
            rules: RuleScorer::new(),
        }
    }

    pub fn model(&self) -> &Arc<dyn RiskModel> {
        &self.model
    }

    /// The model's declared inputs must all exist in the feature schema.
    pub fn is_usable(&self, fv: &FeatureVector) -> Result<(), ScoreUnavailable> {
        let names = self.model.feature_names();
        if names.is_empty() {
            return Err(ScoreUnavailable::ContractMismatch(
                "model declares no input features".into(),
            ));
        }
        let missing: Vec<&str> = names
            .iter()
            .filter(|n| !fv.contains(n))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ScoreUnavailable::ContractMismatch(format!(
                "unknown features: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn score(&self, fv: &FeatureVector) -> Result<ScoreResult, ScoreUnavailable> {
        self.is_usable(fv)?;
        let row = fv
            .select(self.model.feature_names())
            .ok_or_else(|| ScoreUnavailable::ContractMismatch("feature lookup failed".into()))?;

        let [safe, malicious] = self
            .model
            .predict_proba(&row)
            .map_err(|e| ScoreUnavailable::Inference(e.to_string()))?;
        let probabilities = normalize_probabilities(ClassProbabilities { safe, malicious });

        let risk_score = (MAX_RISK * probabilities.malicious).clamp(0.0, MAX_RISK);
        let confidence = probabilities.safe.max(probabilities.malicious);
        debug!(
            kind = self.model.kind(),
            malicious = probabilities.malicious,
            risk_score,
            "model scorer"
        );

        let explanations = match self.importance_explanations(fv) {
            Some(list) => list,
            None => {
                debug!("model exposes no usable importances; borrowing rule explanations");
                self.rules.explain(fv)
            }
        };

        Ok(ScoreResult {
            risk_score,
            confidence,
            probabilities,
            explanations,
            provenance: Provenance::Model,
            rule_tier: None,
        })
    }

    /// Top model importances mapped back to schema features.
    fn importance_explanations(&self, fv: &FeatureVector) -> Option<Vec<FactorExplanation>> {
        let importances = self.model.feature_importances()?;

        let mut ranked: Vec<(Feature, f64)> = self
            .model
            .feature_names()
            .iter()
            .zip(importances)
            .filter_map(|(name, imp)| {
                let feature = Feature::from_name(name)?;
                (imp.is_finite() && imp > 0.0).then_some((feature, imp))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(TOP_IMPORTANCES);

        let total: f64 = ranked.iter().map(|(_, imp)| imp).sum();
        if ranked.is_empty() || total <= 0.0 {
            return None;
        }

        Some(
            ranked
                .into_iter()
                .map(|(feature, imp)| {
                    FactorExplanation::new(
                        humanize(feature.name()),
                        (imp / total).clamp(0.0, 1.0),
                        format_value(fv.get(feature)),
                        format!("Model weight {imp:.3} on {}", feature.name()),
                    )
                })
                .collect(),
        )
    }
}

/// `has_read_sms` → `Has Read Sms`
fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{LinearRiskModel, ModelError, ModelResult};

    struct FixedModel {
        names: Vec<String>,
        output: ModelResult<[f64; 2]>,
    }

    impl RiskModel for FixedModel {
        fn kind(&self) -> &'static str {
            "fixed"
        }
        fn feature_names(&self) -> &[String] {
            &self.names
        }
        fn predict_proba(&self, _row: &[f64]) -> ModelResult<[f64; 2]> {
            match &self.output {
                Ok(p) => Ok(*p),
                Err(e) => Err(ModelError::Inference(e.to_string())),
            }
        }
    }

    fn fixed(output: ModelResult<[f64; 2]>) -> Arc<dyn RiskModel> {
        Arc::new(FixedModel {
            names: vec!["total_permissions".into()],
            output,
        })
    }

    fn overlay_vector() -> FeatureVector {
        FeatureVector::zeroed()
            .with(Feature::TotalPermissions, 2.0)
            .with(Feature::DangerousPermissions, 2.0)
            .with(Feature::PermissionRatio, 1.0)
            .with(Feature::HasSystemAlertWindow, 1.0)
            .with(Feature::HasBindAccessibilityService, 1.0)
    }

    #[test]
    fn test_risk_follows_malicious_probability() {
        let scorer = ModelScorer::new(fixed(Ok([0.2, 0.8])));
        let result = scorer.score(&overlay_vector()).unwrap();
        assert!((result.risk_score - 8.0).abs() < 1e-9);
        assert!((result.confidence - 0.8).abs() < 1e-9);
        assert_eq!(result.provenance, Provenance::Model);
    }

    #[test]
    fn test_malicious_half_maps_to_at_least_five() {
        let scorer = ModelScorer::new(fixed(Ok([0.5, 0.5])));
        let result = scorer.score(&FeatureVector::zeroed()).unwrap();
        assert!(result.risk_score >= 5.0);
    }

    #[test]
    fn test_nan_probabilities_become_neutral() {
        let scorer = ModelScorer::new(fixed(Ok([f64::NAN, 0.9])));
        let result = scorer.score(&FeatureVector::zeroed()).unwrap();
        assert_eq!(result.probabilities, ClassProbabilities::NEUTRAL);
        assert_eq!(result.risk_score, 5.0);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_inference_error_is_unavailable() {
        let scorer = ModelScorer::new(fixed(Err(ModelError::Inference("boom".into()))));
        assert!(matches!(
            scorer.score(&FeatureVector::zeroed()),
            Err(ScoreUnavailable::Inference(_))
        ));
    }

    #[test]
    fn test_contract_mismatch() {
        let model: Arc<dyn RiskModel> = Arc::new(FixedModel {
            names: vec!["total_permissions".into(), "dex_entropy".into()],
            output: Ok([0.5, 0.5]),
        });
        let scorer = ModelScorer::new(model);
        match scorer.is_usable(&FeatureVector::zeroed()) {
            Err(ScoreUnavailable::ContractMismatch(msg)) => assert!(msg.contains("dex_entropy")),
            other => panic!("expected contract mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_no_importances_borrows_rule_explanations() {
        let scorer = ModelScorer::new(fixed(Ok([0.1, 0.9])));
        let fv = overlay_vector();
        let result = scorer.score(&fv).unwrap();
        assert_eq!(result.explanations, RuleScorer::new().explain(&fv));
    }

    #[test]
    fn test_linear_importances_top_five() {
        let names: Vec<String> = [
            "permission_ratio",
            "is_self_signed",
            "has_system_alert_window",
            "has_bind_accessibility_service",
            "cert_valid",
            "min_sdk",
            "file_size_mb",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let coefs = vec![3.0, 1.0, 2.5, 2.0, -1.5, 0.01, 0.0];
        let model = LinearRiskModel::new(names, coefs, -3.0).unwrap();
        let scorer = ModelScorer::new(Arc::new(model));

        let result = scorer.score(&overlay_vector()).unwrap();
        assert_eq!(result.explanations.len(), 5);
        assert_eq!(result.explanations[0].name, "Permission Ratio");
        assert_eq!(result.explanations[0].display_value, "1");
        let sum: f64 = result.explanations.iter().map(|e| e.importance).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(result
            .explanations
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("has_read_sms"), "Has Read Sms");
        assert_eq!(humanize("file_size_mb"), "File Size Mb");
    }
}
