//! Trained risk model contract and artifact loading
//!
//! A model is an opaque binary classifier over a fixed, ordered list of
//! feature names. Artifacts are tagged JSON documents:
//!
//! ```json
//! { "kind": "linear", "feature_names": [...], "coefficients": [...], "intercept": -2.0 }
//! { "kind": "gbdt",   "feature_names": [...], "model": { ...gbdt-rs JSON... } }
//! ```
//!
//! Loading happens once at startup. The resulting handle is immutable and
//! shared across requests as `Arc<dyn RiskModel>`.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::gbdt_model::GbdtRiskModel;

/// Errors raised while loading or running a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(String),

    #[error("unsupported model kind: {0}")]
    UnsupportedKind(String),

    #[error("feature contract mismatch: {0}")]
    ContractMismatch(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A loaded binary classifier.
pub trait RiskModel: Send + Sync {
    /// Short identifier of the model family, e.g. `"linear"`.
    fn kind(&self) -> &'static str;

    /// Ordered input feature names this model was trained on.
    fn feature_names(&self) -> &[String];

    /// `[safe, malicious]` probabilities for one input row ordered as
    /// [`feature_names`](Self::feature_names).
    fn predict_proba(&self, row: &[f64]) -> ModelResult<[f64; 2]>;

    /// Per-feature importance aligned with `feature_names`, when the model
    /// family exposes one.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

fn check_width(model: &dyn RiskModel, row: &[f64]) -> ModelResult<()> {
    let expected = model.feature_names().len();
    if row.len() != expected {
        return Err(ModelError::Inference(format!(
            "expected {expected} inputs, got {}",
            row.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Logistic model
// ---------------------------------------------------------------------------

/// Logistic regression over named features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRiskModel {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

impl LinearRiskModel {
    pub fn new(
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> ModelResult<Self> {
        let model = Self {
            feature_names,
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.feature_names.is_empty() {
            return Err(ModelError::ContractMismatch(
                "model declares no input features".into(),
            ));
        }
        if self.coefficients.len() != self.feature_names.len() {
            return Err(ModelError::ContractMismatch(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Parse("non-finite model parameter".into()));
        }
        Ok(())
    }
}

impl RiskModel for LinearRiskModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, row: &[f64]) -> ModelResult<[f64; 2]> {
        check_width(self, row)?;
        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        let malicious = 1.0 / (1.0 + (-logit).exp());
        if !malicious.is_finite() {
            return Err(ModelError::Inference(format!("non-finite output for logit {logit}")));
        }
        Ok([1.0 - malicious, malicious])
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.coefficients.iter().map(|c| c.abs()).collect())
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ArtifactHeader {
    kind: String,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Linear(LinearRiskModel),
    Gbdt(GbdtRiskModel),
}

impl ModelArtifact {
    /// Parse an artifact from its JSON text.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        // Peek at the tag first so an unknown kind gets its own error
        let header: ArtifactHeader =
            serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))?;
        if !matches!(header.kind.as_str(), "linear" | "gbdt") {
            return Err(ModelError::UnsupportedKind(header.kind));
        }
        let artifact: ModelArtifact =
            serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn load(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    fn validate(&self) -> ModelResult<()> {
        match self {
            ModelArtifact::Linear(m) => m.validate(),
            ModelArtifact::Gbdt(m) => m.validate(),
        }
    }

    pub fn into_model(self) -> Arc<dyn RiskModel> {
        match self {
            ModelArtifact::Linear(m) => Arc::new(m),
            ModelArtifact::Gbdt(m) => Arc::new(m),
        }
    }
}

/// Load a model artifact from disk into a shareable handle.
pub fn load_model(path: &Path) -> ModelResult<Arc<dyn RiskModel>> {
    let model = ModelArtifact::load(path)?.into_model();
    info!(
        path = %path.display(),
        kind = model.kind(),
        features = model.feature_names().len(),
        "Loaded risk model"
    );
    Ok(model)
}
