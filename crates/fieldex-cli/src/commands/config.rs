//! Config command - manage source configurations.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use fieldex_core::models::{AnchorPair, FieldSpec, NamePrefix, PatternList, SourceConfig};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show a source configuration
    Show {
        /// Path to a <source>.toml file
        path: PathBuf,

        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Create a template configuration for a new source
    Init(InitArgs),
}

#[derive(Args)]
struct InitArgs {
    /// Source name (matches the plan subdirectory)
    source: String,

    /// Output path (default: ./<source>.toml)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { path, json } => show_config(&path, json),
        ConfigCommand::Init(init_args) => init_config(init_args),
    }
}

fn show_config(path: &PathBuf, json: bool) -> anyhow::Result<()> {
    let config = SourceConfig::from_file(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.toml", args.source.to_lowercase())));

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let config = template(&args.source);
    config.save(&output_path)?;

    println!(
        "{} Created configuration for '{}' at {}",
        style("✓").green(),
        args.source,
        output_path.display()
    );

    Ok(())
}

/// A starter configuration with one example of each section.
fn template(source: &str) -> SourceConfig {
    let mut config = SourceConfig::new(source);
    config.fields.push(FieldSpec {
        element: "SSN".to_string(),
        patterns: PatternList::Single(r"\d{3}-\d{2}-\d{4}".to_string()),
        cleaner: None,
    });
    config.fields.push(FieldSpec {
        element: "DOB".to_string(),
        patterns: PatternList::Ordered(vec![
            r"DOB:?\s*\d{1,2}/\d{1,2}/\d{2,4}".to_string(),
            r"Date of Birth:?\s*\d{1,2}/\d{1,2}/\d{2,4}".to_string(),
        ]),
        cleaner: None,
    });
    config.name_anchors.push(AnchorPair {
        start: "Employee:".to_string(),
        stop: "SSN".to_string(),
        prefix: NamePrefix::Name,
    });
    config
        .duplicate_map
        .insert("DOB".to_string(), "SDOB".to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w2.toml");
        template("W2").save(&path).unwrap();

        let loaded = SourceConfig::from_file(&path).unwrap();
        assert_eq!(loaded.source, "W2");
        assert_eq!(loaded.fields.len(), 2);
        assert_eq!(loaded.name_anchors.len(), 1);
        assert_eq!(loaded.duplicate_map["DOB"], "SDOB");
    }
}
