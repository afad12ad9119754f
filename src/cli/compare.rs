//! Compare command - diff two packages

use anyhow::Result;
use std::path::Path;

use super::{build_pipeline, emit, load_single, output_format, OutputArgs};
use apkshield::reporters;

pub fn run(a: &Path, b: &Path, out: &OutputArgs, config_path: Option<&Path>) -> Result<()> {
    let format = output_format(out)?;
    let raw_a = load_single(a)?;
    let raw_b = load_single(b)?;
    let pipeline = build_pipeline(out, config_path);

    let comparison = pipeline.compare_facts(&raw_a, &raw_b);
    emit(out, &reporters::render_comparison(&comparison, format)?)
}
