//! Configuration module for apkshield
//!
//! This module handles:
//! - Post-hoc adjustment weights
//! - The optional model artifact path
//! - The model-tier time budget

mod assessment_config;

pub use assessment_config::{
    user_config_path, AdjustmentWeights, AdjustmentsLayer, AssessmentConfig, ConfigError,
    ConfigLayer, ModelConfig, ScoringConfig, CONFIG_FILE_NAME, EXAMPLE_CONFIG, MODEL_PATH_ENV,
    RULE_WEIGHTS_ENV,
};
