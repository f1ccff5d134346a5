//! Check command - compile every source configuration and report errors.

use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;

use fieldex_core::extract::CompiledSource;
use fieldex_core::models::SourceConfig;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Configuration file or directory of <source>.toml files
    #[arg(required = true)]
    path: PathBuf,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let files: Vec<PathBuf> = if args.path.is_dir() {
        let pattern = args.path.join("*.toml");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Config path is not valid UTF-8"))?;
        glob(pattern)?.filter_map(|r| r.ok()).collect()
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        anyhow::bail!("No .toml configurations found in {}", args.path.display());
    }

    let mut failures = 0usize;
    for path in &files {
        match check_one(path) {
            Ok(summary) => {
                println!(
                    "{} {} — {}",
                    style("✓").green(),
                    path.display(),
                    summary
                );
            }
            Err(e) => {
                failures += 1;
                println!("{} {} — {}", style("✗").red(), path.display(), e);
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{} of {} configurations failed", failures, files.len());
    }
    println!(
        "{} All {} configurations compile",
        style("✓").green(),
        files.len()
    );
    Ok(())
}

fn check_one(path: &PathBuf) -> anyhow::Result<String> {
    let config = SourceConfig::from_file(path)?;
    let compiled = CompiledSource::compile(config)?;
    Ok(format!(
        "{}: {} fields, {} anchor pairs",
        compiled.config.source,
        compiled.fields.len(),
        compiled.anchors.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_check_reports_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w2.toml");
        fs::write(
            &path,
            r#"
source = "W2"

[[fields]]
element = "SSN"
patterns = "[unclosed"
"#,
        )
        .unwrap();

        let err = check_one(&path).unwrap_err();
        assert!(err.to_string().contains("SSN"));
    }

    #[test]
    fn test_check_accepts_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w2.toml");
        fs::write(
            &path,
            r#"
source = "W2"

[[fields]]
element = "SSN"
patterns = '\d{3}-\d{2}-\d{4}'
"#,
        )
        .unwrap();

        let summary = check_one(&path).unwrap();
        assert!(summary.contains("1 fields"));
    }
}
