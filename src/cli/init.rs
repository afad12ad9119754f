//! Init command - write an example configuration file

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

use apkshield::config::{user_config_path, CONFIG_FILE_NAME, EXAMPLE_CONFIG};

/// Run the init command
pub fn run(user: bool, force: bool) -> Result<()> {
    let target = if user {
        user_config_path().context("Could not determine the user config directory")?
    } else {
        PathBuf::from(CONFIG_FILE_NAME)
    };

    println!("\n{} Initializing apkshield\n", style("🛡").bold());
    if write_config(&target, force)? {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(target.display()).cyan()
        );
    } else {
        println!(
            "{} Config already exists at {} (use --force to overwrite)",
            style("✓").green(),
            style(target.display()).cyan()
        );
    }

    println!("\n{}", style("Next steps:").bold());
    println!("  1. Point [model] path at a trained artifact, or keep rule-only scoring");
    println!("  2. Run: {}", style("apkshield assess facts.json").cyan());
    println!();
    Ok(())
}

/// Write the example config; returns false when the file exists and `force` is unset.
fn write_config(target: &Path, force: bool) -> Result<bool> {
    if target.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(target, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apkshield::config::ConfigLayer;

    #[test]
    fn test_write_config_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        assert!(write_config(&path, false).unwrap());
        std::fs::write(&path, "# edited").unwrap();
        assert!(!write_config(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited");
        assert!(write_config(&path, true).unwrap());
    }

    #[test]
    fn test_example_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        write_config(&path, false).unwrap();
        assert!(ConfigLayer::from_file(&path).is_ok());
    }
}
