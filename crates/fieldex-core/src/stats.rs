//! Corpus summary statistics for reporting.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::record::{Confidence, ExtractionRecord};

/// Per-element found/not-found breakdown within one source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ElementStats {
    pub found: usize,
    pub not_found: usize,
    pub flagged: usize,
}

impl ElementStats {
    pub fn total(&self) -> usize {
        self.found + self.not_found
    }

    pub fn found_percentage(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            100.0 * self.found as f64 / self.total() as f64
        }
    }
}

/// Summary of one source's corpus run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub documents_processed: usize,
    pub records: usize,
    pub elements: BTreeMap<String, ElementStats>,
    pub flag_counts: BTreeMap<String, usize>,
    pub confidence_counts: BTreeMap<String, usize>,
    /// Documents missing at least one critical element, keyed by filename.
    pub missing_critical: BTreeMap<String, Vec<String>>,
}

impl SourceStats {
    /// Summarize a validated record set for one source. `critical` lists
    /// the elements every document is expected to yield.
    pub fn summarize(source: &str, records: &[ExtractionRecord], critical: &[String]) -> Self {
        let mut stats = SourceStats {
            source: source.to_string(),
            ..Default::default()
        };

        let mut documents: BTreeSet<&str> = BTreeSet::new();
        let mut found_per_doc: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for record in records.iter().filter(|r| r.source == source) {
            stats.records += 1;
            documents.insert(&record.filename);

            let element = stats.elements.entry(record.element.clone()).or_default();
            if record.is_missing() {
                element.not_found += 1;
            } else {
                element.found += 1;
                found_per_doc
                    .entry(&record.filename)
                    .or_default()
                    .insert(&record.element);
            }
            if !record.flags.is_empty() {
                element.flagged += 1;
            }

            for flag in &record.flags {
                *stats.flag_counts.entry(flag.clone()).or_default() += 1;
            }
            *stats
                .confidence_counts
                .entry(record.confidence.to_string())
                .or_default() += 1;
        }

        stats.documents_processed = documents.len();

        for filename in &documents {
            let found = found_per_doc.get(filename);
            let missing: Vec<String> = critical
                .iter()
                .filter(|e| !found.is_some_and(|f| f.contains(e.as_str())))
                .cloned()
                .collect();
            if !missing.is_empty() {
                stats.missing_critical.insert(filename.to_string(), missing);
            }
        }

        stats
    }

    pub fn high_confidence(&self) -> usize {
        self.confidence_counts
            .get(&Confidence::High.to_string())
            .copied()
            .unwrap_or(0)
    }
}
