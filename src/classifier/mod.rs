//! Package facts → numeric features, and the trained models that consume them
//!
//! Normalization is total and deterministic; model loading is the only
//! fallible operation here and is done once at startup.

pub mod content;
pub mod features;
pub mod gbdt_model;
pub mod model;
pub mod permissions;
pub mod telemetry;

pub use features::{normalize, normalize_at, Feature, FeatureOrigin, FeatureVector, NUM_FEATURES};
pub use gbdt_model::GbdtRiskModel;
pub use model::{load_model, LinearRiskModel, ModelArtifact, ModelError, ModelResult, RiskModel};
pub use telemetry::SyntheticTelemetry;
