//! Assessment configuration (`apkshield.toml`)
//!
//! Example:
//! ```toml
//! [adjustments]
//! overlay_accessibility = 1.5
//! suspicious_strings = 2.0
//! invalid_certificate = 2.0
//!
//! [model]
//! path = "models/risk_model.json"
//!
//! [scoring]
//! budget_ms = 50
//! ```
//!
//! Layers, lowest priority first: built-in defaults, the user config
//! (`~/.config/apkshield/config.toml`), the project file, then the
//! `RULE_WEIGHTS_JSON` and `APKSHIELD_MODEL_PATH` environment variables.
//! A broken layer is skipped with a warning; loading never fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Project config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "apkshield.toml";

/// Legacy JSON knob with keys `system_alert`, `suspicious_url`, `invalid_cert`.
pub const RULE_WEIGHTS_ENV: &str = "RULE_WEIGHTS_JSON";
pub const MODEL_PATH_ENV: &str = "APKSHIELD_MODEL_PATH";

/// Errors from reading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid weight {name} = {value}: must be finite and non-negative")]
    InvalidWeight { name: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Post-hoc boosts applied by the adjustment stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentWeights {
    /// Overlay + accessibility-service permissions both declared
    pub overlay_accessibility: f64,
    /// At least one suspicious string extracted
    pub suspicious_strings: f64,
    /// Certificate self-signed or invalid
    pub invalid_certificate: f64,
}

impl Default for AdjustmentWeights {
    fn default() -> Self {
        Self {
            overlay_accessibility: 1.5,
            suspicious_strings: 2.0,
            invalid_certificate: 2.0,
        }
    }
}

impl AdjustmentWeights {
    fn check(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidWeight { name, value })
        }
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        [
            ("overlay_accessibility", self.overlay_accessibility),
            ("suspicious_strings", self.suspicious_strings),
            ("invalid_certificate", self.invalid_certificate),
        ]
        .into_iter()
        .filter_map(|(name, value)| Self::check(name, value).err())
        .collect()
    }

    /// Replace invalid weights with their defaults.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        for err in self.validate() {
            warn!("{err}; using default");
            if let ConfigError::InvalidWeight { name, .. } = err {
                match name {
                    "overlay_accessibility" => {
                        self.overlay_accessibility = defaults.overlay_accessibility
                    }
                    "suspicious_strings" => self.suspicious_strings = defaults.suspicious_strings,
                    _ => self.invalid_certificate = defaults.invalid_certificate,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model artifact loaded at startup; no model means rule scoring only
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Per-tier time budget for the model tier
    pub budget_ms: Option<u64>,
}

impl ScoringConfig {
    pub fn budget(&self) -> Option<Duration> {
        self.budget_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub adjustments: AdjustmentWeights,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
}

// ---------------------------------------------------------------------------
// Partial layers
// ---------------------------------------------------------------------------

/// One config source; unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub adjustments: AdjustmentsLayer,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdjustmentsLayer {
    pub overlay_accessibility: Option<f64>,
    pub suspicious_strings: Option<f64>,
    pub invalid_certificate: Option<f64>,
}

impl ConfigLayer {
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Layer from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let rule_weights = std::env::var(RULE_WEIGHTS_ENV).ok();
        let model_path = std::env::var(MODEL_PATH_ENV).ok();
        Self::from_env_values(rule_weights.as_deref(), model_path.as_deref())
    }

    /// Layer from the legacy `RULE_WEIGHTS_JSON` / model path variables.
    pub fn from_env_values(
        rule_weights_json: Option<&str>,
        model_path: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut layer = ConfigLayer::default();
        if let Some(json) = rule_weights_json.filter(|s| !s.trim().is_empty()) {
            let weights: HashMap<String, f64> =
                serde_json::from_str(json).map_err(|e| ConfigError::Parse {
                    path: RULE_WEIGHTS_ENV.to_string(),
                    message: e.to_string(),
                })?;
            layer.adjustments.overlay_accessibility = weights.get("system_alert").copied();
            layer.adjustments.suspicious_strings = weights.get("suspicious_url").copied();
            layer.adjustments.invalid_certificate = weights.get("invalid_cert").copied();
        }
        if let Some(path) = model_path.filter(|s| !s.trim().is_empty()) {
            layer.model.path = Some(PathBuf::from(path));
        }
        Ok(layer)
    }
}

impl AssessmentConfig {
    /// Overlay `layer` on top of this config (layer wins).
    pub fn merge(&mut self, layer: ConfigLayer) {
        let adj = layer.adjustments;
        if let Some(v) = adj.overlay_accessibility {
            self.adjustments.overlay_accessibility = v;
        }
        if let Some(v) = adj.suspicious_strings {
            self.adjustments.suspicious_strings = v;
        }
        if let Some(v) = adj.invalid_certificate {
            self.adjustments.invalid_certificate = v;
        }
        if layer.model.path.is_some() {
            self.model.path = layer.model.path;
        }
        if layer.scoring.budget_ms.is_some() {
            self.scoring.budget_ms = layer.scoring.budget_ms;
        }
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match ConfigLayer::from_file(path) {
            Ok(layer) => {
                debug!("Loaded config from {}", path.display());
                self.merge(layer);
            }
            Err(e) => warn!("{e}"),
        }
    }

    /// Resolve every layer. `project` overrides `<working_dir>/apkshield.toml`.
    pub fn load(project: Option<&Path>, working_dir: &Path) -> Self {
        let env = ConfigLayer::from_env().unwrap_or_else(|e| {
            warn!("{e}");
            ConfigLayer::default()
        });
        Self::load_layers(project, working_dir, user_config_path().as_deref(), env)
    }

    /// Resolve with every source supplied by the caller.
    pub fn load_layers(
        project: Option<&Path>,
        working_dir: &Path,
        user: Option<&Path>,
        env: ConfigLayer,
    ) -> Self {
        let mut config = AssessmentConfig::default();

        if let Some(user) = user {
            config.merge_file(user);
        }

        match project {
            Some(path) if !path.exists() => warn!("Config file {} not found", path.display()),
            Some(path) => config.merge_file(path),
            None => config.merge_file(&working_dir.join(CONFIG_FILE_NAME)),
        }

        config.merge(env);
        config.adjustments.sanitize();
        config
    }
}

/// `~/.config/apkshield/config.toml` (platform equivalent).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("apkshield").join("config.toml"))
}

/// Commented template written by `apkshield init`.
pub const EXAMPLE_CONFIG: &str = r#"# apkshield configuration

[adjustments]
# Boost when both overlay and accessibility-service permissions are declared
overlay_accessibility = 1.5
# Boost when any suspicious string was extracted
suspicious_strings = 2.0
# Boost when the signing certificate is self-signed or invalid
invalid_certificate = 2.0

[model]
# Trained model artifact (JSON, "kind" = "linear" | "gbdt").
# Without one, packages are scored by the rule engine.
# path = "models/risk_model.json"

[scoring]
# Discard model results that take longer than this (milliseconds)
# budget_ms = 50
"#;

#[cfg(test)]
mod tests;
