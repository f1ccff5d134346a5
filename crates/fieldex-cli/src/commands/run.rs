//! Run command - extract fields from a plan directory of documents.
//!
//! A plan directory holds one subdirectory per source type, each filled
//! with `.txt` documents. Every discovered source must have a matching
//! `<source>.toml` in the configs directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use fieldex_core::models::SourceConfig;
use fieldex_core::pipeline::{Document, PlanRunner};
use fieldex_core::stats::SourceStats;
use fieldex_core::{ExtractionRecord, OutputRow};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Plan directory with one subdirectory of .txt files per source
    #[arg(required = true)]
    plan: PathBuf,

    /// Directory of <source>.toml configurations
    #[arg(short, long, default_value = "configs")]
    configs: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Restrict the run to these sources (repeatable; default: all)
    #[arg(short, long = "source")]
    sources: Vec<String>,

    /// Print a per-source summary after the run
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Flattened rows as CSV
    Csv,
    /// Full records as JSON
    Json,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.plan.is_dir() {
        anyhow::bail!("Plan directory not found: {}", args.plan.display());
    }

    let mut documents = discover_documents(&args.plan)?;
    if !args.sources.is_empty() {
        documents.retain(|d| args.sources.contains(&d.source));
    }
    if documents.is_empty() {
        anyhow::bail!(
            "No matching .txt documents found under {}",
            args.plan.display()
        );
    }

    let sources: Vec<String> = {
        let mut s: Vec<String> = documents.iter().map(|d| d.source.clone()).collect();
        s.sort();
        s.dedup();
        s
    };
    println!(
        "{} Found {} documents across {} sources",
        style("ℹ").blue(),
        documents.len(),
        sources.len()
    );

    // Every discovered source needs a configuration before anything runs.
    let mut runner = PlanRunner::new();
    let mut critical: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for source in &sources {
        let config_path = args.configs.join(format!("{}.toml", source.to_lowercase()));
        if !config_path.exists() {
            anyhow::bail!(
                "No configuration for source '{}' (expected {})",
                source,
                config_path.display()
            );
        }
        let config = SourceConfig::from_file(&config_path)?;
        critical.insert(source.clone(), config.validation.critical_elements.clone());
        runner.add_source(config)?;
        info!("Loaded configuration for {}", source);
    }

    // Validation needs the whole corpus at once, so there is no useful
    // per-document position to report; a spinner covers the run.
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Extracting from {} documents...", documents.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    let records = runner.run(&documents)?;
    pb.finish_and_clear();

    println!(
        "{} Extracted {} records from {} documents",
        style("✓").green(),
        records.len(),
        documents.len()
    );

    let output = format_records(&records, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.summary {
        for source in &sources {
            let empty = Vec::new();
            let crit = critical.get(source).unwrap_or(&empty);
            print_summary(&SourceStats::summarize(source, &records, crit));
        }
    }

    debug!("Total run time: {:?}", start.elapsed());

    Ok(())
}

/// Walk the plan directory: each subdirectory is a source, each .txt file
/// inside a document.
fn discover_documents(plan: &Path) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();

    let pattern = plan.join("*").join("*.txt");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Plan path is not valid UTF-8"))?;

    for entry in glob(pattern)? {
        let path = entry?;
        let source = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Cannot determine source for {}", path.display()))?
            .to_string();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Non-UTF-8 filename: {}", path.display()))?
            .to_string();
        // One unreadable document must not abort the run.
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        debug!("Discovered {}/{} ({} bytes)", source, filename, text.len());
        documents.push(Document::new(source, filename, text));
    }

    Ok(documents)
}

fn format_records(records: &[ExtractionRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for record in records {
                wtr.serialize(OutputRow::from(record))?;
            }
            let data = String::from_utf8(wtr.into_inner()?)?;
            Ok(data)
        }
    }
}

fn print_summary(stats: &SourceStats) {
    println!();
    println!(
        "{} {} — {} documents, {} records",
        style("■").cyan(),
        style(&stats.source).bold(),
        stats.documents_processed,
        stats.records
    );

    for (element, counts) in &stats.elements {
        println!(
            "  {:<12} found {}/{} ({:.0}%)",
            element,
            counts.found,
            counts.total(),
            counts.found_percentage()
        );
    }

    if !stats.flag_counts.is_empty() {
        println!("  {}", style("Flags:").yellow());
        for (flag, count) in &stats.flag_counts {
            println!("    {} × {}", count, flag);
        }
    }

    println!("  {}", style("Confidence:").blue());
    for (level, count) in &stats.confidence_counts {
        println!("    {:<8} {}", level, count);
    }

    if !stats.missing_critical.is_empty() {
        println!(
            "  {}",
            style("Documents missing critical elements:").red()
        );
        for (filename, missing) in &stats.missing_critical {
            println!("    {} — {}", filename, missing.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_documents_by_source_folder() {
        let dir = tempfile::tempdir().unwrap();
        let w2 = dir.path().join("W2");
        fs::create_dir(&w2).unwrap();
        fs::write(w2.join("alice.txt"), "SSN: 123-45-6789").unwrap();
        fs::write(w2.join("notes.md"), "ignored").unwrap();

        let docs = discover_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "W2");
        assert_eq!(docs[0].filename, "alice.txt");
    }

    #[test]
    fn test_unreadable_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let w2 = dir.path().join("W2");
        fs::create_dir(&w2).unwrap();
        fs::write(w2.join("good.txt"), "SSN: 123-45-6789").unwrap();
        // Invalid UTF-8 makes read_to_string fail for this file only.
        fs::write(w2.join("garbled.txt"), [0xFFu8, 0xFE, 0x00, 0x9F]).unwrap();

        let docs = discover_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "good.txt");
    }

    #[test]
    fn test_csv_output_has_all_columns() {
        let mut record = ExtractionRecord::found("W2", "a.txt", "SSN", "123-45-6789", 1, 10);
        record.cleaned_value = Some("123-45-6789".to_string());

        let csv = format_records(&[record], OutputFormat::Csv).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "source,filename,element,value,cleaned_value,extraction_order,\
             extraction_position,flags,flag_reasons,confidence"
        );
    }
}
