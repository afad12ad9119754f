//! Gradient-boosted tree risk model
//!
//! Wraps the `gbdt` crate behind [`RiskModel`]. The artifact stores the
//! ordered feature names next to the gbdt-rs native JSON model, trained with
//! the `LogLikelyhood` loss so `predict` yields the malicious probability.
//!
//! Note: the gbdt crate internally uses `f32` (`ValueType`), while feature
//! vectors store `f64`. Conversions happen at the crate boundary.
//!
//! gbdt-rs has no per-feature importance accessor, so this model reports
//! none and explanations fall back to the rule scorer.

use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use super::model::{ModelError, ModelResult, RiskModel};

#[inline]
fn row_to_f32(row: &[f64]) -> Vec<f32> {
    row.iter().map(|&v| v as f32).collect()
}

/// Ordered feature contract plus a trained `GBDT`.
#[derive(Serialize, Deserialize)]
pub struct GbdtRiskModel {
    feature_names: Vec<String>,
    model: GBDT,
}

impl GbdtRiskModel {
    pub fn new(feature_names: Vec<String>, model: GBDT) -> ModelResult<Self> {
        let wrapped = Self {
            feature_names,
            model,
        };
        wrapped.validate()?;
        Ok(wrapped)
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        if self.feature_names.is_empty() {
            return Err(ModelError::ContractMismatch(
                "model declares no input features".into(),
            ));
        }
        Ok(())
    }

    /// Return a reference to the underlying GBDT model.
    pub fn inner(&self) -> &GBDT {
        &self.model
    }
}

impl RiskModel for GbdtRiskModel {
    fn kind(&self) -> &'static str {
        "gbdt"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, row: &[f64]) -> ModelResult<[f64; 2]> {
        if row.len() != self.feature_names.len() {
            return Err(ModelError::Inference(format!(
                "expected {} inputs, got {}",
                self.feature_names.len(),
                row.len()
            )));
        }
        let data = vec![Data::new_test_data(row_to_f32(row), None)];
        let preds = self.model.predict(&data);
        let malicious = preds
            .first()
            .copied()
            .map(f64::from)
            .ok_or_else(|| ModelError::Inference("model returned no prediction".into()))?;
        if !malicious.is_finite() {
            return Err(ModelError::Inference(format!(
                "non-finite prediction {malicious}"
            )));
        }
        let malicious = malicious.clamp(0.0, 1.0);
        Ok([1.0 - malicious, malicious])
    }
}
