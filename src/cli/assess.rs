//! Assess and batch commands

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use super::{build_pipeline, emit, load_facts, load_single, output_format, OutputArgs};
use apkshield::reporters;

/// Assess a single package
pub fn run(facts: &Path, out: &OutputArgs, config_path: Option<&Path>) -> Result<()> {
    let format = output_format(out)?;
    let raw = load_single(facts)?;
    let pipeline = build_pipeline(out, config_path);

    let start = Instant::now();
    let assessment = pipeline.assess(&raw);
    info!(
        package = %assessment.package.package_name,
        score = assessment.risk_score,
        provenance = %assessment.provenance,
        "Assessed in {:?}",
        start.elapsed()
    );

    emit(out, &reporters::render_assessment(&assessment, format)?)
}

/// Assess every package in every file, preserving input order
pub fn run_batch(files: &[PathBuf], out: &OutputArgs, config_path: Option<&Path>) -> Result<()> {
    let format = output_format(out)?;
    let mut batch = Vec::new();
    for file in files {
        batch.extend(load_facts(file)?);
    }
    let pipeline = build_pipeline(out, config_path);

    let start = Instant::now();
    let assessments = pipeline.assess_batch(&batch);
    info!("Assessed {} packages in {:?}", assessments.len(), start.elapsed());

    emit(out, &reporters::render_batch(&assessments, format)?)
}
