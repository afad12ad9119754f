//! CLI command definitions and handlers

mod assess;
mod compare;
mod init;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use apkshield::config::AssessmentConfig;
use apkshield::models::RawFacts;
use apkshield::pipeline::AssessmentPipeline;
use apkshield::reporters::OutputFormat;

/// apkshield - Explainable banking-trojan risk assessment for Android packages
///
/// Reads package facts (JSON produced by a package inspector) and scores them.
#[derive(Parser, Debug)]
#[command(name = "apkshield")]
#[command(
    version,
    about = "Explainable banking-trojan risk assessment for Android application packages",
    after_help = "\
Examples:
  apkshield assess facts.json                      Assess one package
  apkshield assess facts.json --format json        JSON output for scripting
  apkshield compare old.json new.json              Diff two versions of an app
  apkshield batch a.json b.json c.json             Assess many packages in parallel
  apkshield init                                   Write an example apkshield.toml"
)]
pub struct Cli {
    /// Config file (default: ./apkshield.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every scoring command
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Model artifact to load (overrides config and APKSHIELD_MODEL_PATH)
    #[arg(long, env = "APKSHIELD_MODEL_PATH")]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an apkshield.toml config file with example settings
    Init {
        /// Write the user-level config instead of ./apkshield.toml
        #[arg(long)]
        user: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Assess one package from its facts JSON
    Assess {
        /// Package facts JSON file
        facts: PathBuf,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Compare two packages (B relative to A)
    Compare {
        /// Facts JSON of package A
        a: PathBuf,

        /// Facts JSON of package B
        b: PathBuf,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Assess many packages in parallel
    Batch {
        /// Facts JSON files; a file may hold one object or an array
        #[arg(required = true)]
        facts: Vec<PathBuf>,

        #[command(flatten)]
        out: OutputArgs,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { user, force } => init::run(user, force),
        Commands::Assess { facts, out } => assess::run(&facts, &out, config_path),
        Commands::Compare { a, b, out } => compare::run(&a, &b, &out, config_path),
        Commands::Batch { facts, out } => assess::run_batch(&facts, &out, config_path),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Resolve config and build the pipeline, honouring `--model`.
pub(crate) fn build_pipeline(out: &OutputArgs, config_path: Option<&Path>) -> AssessmentPipeline {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = AssessmentConfig::load(config_path, &cwd);
    if out.model.is_some() {
        config.model.path = out.model.clone();
    }
    AssessmentPipeline::from_config(&config)
}

/// Read one or more facts objects from a JSON file.
pub(crate) fn load_facts(path: &Path) -> Result<Vec<RawFacts>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read facts file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let facts = match value {
        serde_json::Value::Array(_) => serde_json::from_value::<Vec<RawFacts>>(value),
        other => serde_json::from_value::<RawFacts>(other).map(|f| vec![f]),
    }
    .with_context(|| format!("Malformed package facts in {}", path.display()))?;
    Ok(facts)
}

/// Read exactly one facts object.
pub(crate) fn load_single(path: &Path) -> Result<RawFacts> {
    let mut facts = load_facts(path)?;
    if facts.len() != 1 {
        anyhow::bail!(
            "{} holds {} packages; expected exactly one",
            path.display(),
            facts.len()
        );
    }
    Ok(facts.remove(0))
}

pub(crate) fn output_format(out: &OutputArgs) -> Result<OutputFormat> {
    OutputFormat::from_str(&out.format)
}

/// Write rendered output to `--output` or stdout.
pub(crate) fn emit(out: &OutputArgs, rendered: &str) -> Result<()> {
    match &out.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}Report written to: {}",
                style("📄 ").bold(),
                style(path.display()).cyan()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
