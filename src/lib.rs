//! apkshield - Explainable banking-trojan risk assessment for Android packages
//!
//! Turns facts extracted from an application package into a bounded 0-10
//! risk score, a verdict, and a ranked list of human-readable factors.
//! Scoring degrades gracefully: a trained model when one is loaded and
//! usable, the rule engine otherwise, and a neutral result as a last resort.

pub mod assessment;
pub mod classifier;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod scoring;

pub use models::{ComparisonResult, FinalAssessment, RawFacts, Verdict};
pub use pipeline::AssessmentPipeline;
