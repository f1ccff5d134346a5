//! Cross-field and cross-document validation.
//!
//! Runs after the whole corpus has been extracted and normalized. Checks
//! within a single document use only that document's records; the
//! positional outlier check needs statistics over every document of a
//! source, so validation is strictly a post-extraction pass.

pub mod stats;

pub use stats::{collect_position_stats, PositionStats};

use std::collections::BTreeMap;

use tracing::debug;

use crate::clean::parse_canonical;
use crate::models::config::ValidationConfig;
use crate::models::record::{Confidence, ExtractionRecord};

pub const DATE_LOGIC_VIOLATION: &str = "date_logic_violation";
pub const MULTIPLE_EXTRACTIONS: &str = "multiple_extractions";
pub const WITHIN_DOCUMENT_CONFLICT: &str = "within_document_conflict";
pub const WITHIN_DOCUMENT_GAP: &str = "within_document_gap";
pub const POSITIONAL_OUTLIER: &str = "positional_outlier";

const DATE_BIRTH: &str = "DOB";
const DATE_HIRE: &str = "DOH";
const DATE_TERMINATION: &str = "DOTE";

/// Flags suspicious records and assigns the final confidence grade.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate the corpus in place. Per-document checks first, then the
    /// corpus-wide positional check, then confidence assignment.
    pub fn validate(&self, records: &mut [ExtractionRecord]) {
        for indices in document_groups(records).values() {
            self.check_date_logic(records, indices);
            self.check_multiple_extractions(records, indices);
            self.check_conflicts(records, indices);
            self.check_gaps(records, indices);
        }

        self.check_positional_outliers(records);

        for record in records.iter_mut() {
            record.confidence = grade(record);
        }
    }

    /// DOB must precede DOH, and DOH must not come after DOTE. Evaluated
    /// only when all three dates are present and parseable; a violation
    /// flags all three.
    fn check_date_logic(&self, records: &mut [ExtractionRecord], indices: &[usize]) {
        let mut dates: BTreeMap<&str, (usize, chrono::NaiveDate)> = BTreeMap::new();
        for &i in indices {
            let element = records[i].element.as_str();
            if element != DATE_BIRTH && element != DATE_HIRE && element != DATE_TERMINATION {
                continue;
            }
            if dates.contains_key(element) {
                continue;
            }
            if let Some(date) = records[i]
                .cleaned_value
                .as_deref()
                .and_then(parse_canonical)
            {
                let element = match element {
                    DATE_BIRTH => DATE_BIRTH,
                    DATE_HIRE => DATE_HIRE,
                    _ => DATE_TERMINATION,
                };
                dates.insert(element, (i, date));
            }
        }

        let (Some(&(bi, birth)), Some(&(hi, hire)), Some(&(ti, term))) = (
            dates.get(DATE_BIRTH),
            dates.get(DATE_HIRE),
            dates.get(DATE_TERMINATION),
        ) else {
            return;
        };

        if birth < hire && hire <= term {
            return;
        }

        let reason = format!(
            "dates out of order: DOB {} / DOH {} / DOTE {}",
            birth.format("%m/%d/%Y"),
            hire.format("%m/%d/%Y"),
            term.format("%m/%d/%Y"),
        );
        for i in [bi, hi, ti] {
            records[i].add_flag(DATE_LOGIC_VIOLATION, reason.clone());
        }
    }

    /// An element extracted more than once in one document flags every
    /// occurrence, not just the extras.
    fn check_multiple_extractions(&self, records: &mut [ExtractionRecord], indices: &[usize]) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for &i in indices {
            if !records[i].is_missing() {
                *counts.entry(records[i].element.clone()).or_default() += 1;
            }
        }

        for &i in indices {
            let count = counts.get(&records[i].element).copied().unwrap_or(0);
            if count > 1 {
                records[i].add_flag(
                    MULTIPLE_EXTRACTIONS,
                    format!("{} extracted {count} times in this document", records[i].element),
                );
            }
        }
    }

    /// Repeated extractions of one element whose cleaned values disagree.
    fn check_conflicts(&self, records: &mut [ExtractionRecord], indices: &[usize]) {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for &i in indices {
            if let Some(cleaned) = records[i].cleaned_value.clone() {
                let entry = values.entry(records[i].element.clone()).or_default();
                if !entry.contains(&cleaned) {
                    entry.push(cleaned);
                }
            }
        }

        for &i in indices {
            if records[i].cleaned_value.is_none() {
                continue;
            }
            if let Some(distinct) = values.get(&records[i].element) {
                if distinct.len() > 1 {
                    records[i].add_flag(
                        WITHIN_DOCUMENT_CONFLICT,
                        format!(
                            "{} has {} conflicting values: {}",
                            records[i].element,
                            distinct.len(),
                            distinct.join(", "),
                        ),
                    );
                }
            }
        }
    }

    /// Adjacent extractions in a document separated by an implausibly
    /// large positional jump; both ends of the jump are flagged.
    ///
    /// Adjacency is document-wide across elements, ordered by extraction
    /// order with position as the tie-break.
    fn check_gaps(&self, records: &mut [ExtractionRecord], indices: &[usize]) {
        let mut positioned: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| records[i].position.is_some())
            .collect();
        positioned.sort_by_key(|&i| (records[i].extraction_order, records[i].position));

        for pair in positioned.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (Some(pa), Some(pb)) = (records[a].position, records[b].position) else {
                continue;
            };
            let gap = pa.abs_diff(pb);
            if gap > self.config.within_document_gap_threshold {
                let reason = format!(
                    "positions {pa} and {pb} are {gap} characters apart (threshold {})",
                    self.config.within_document_gap_threshold,
                );
                records[a].add_flag(WITHIN_DOCUMENT_GAP, reason.clone());
                records[b].add_flag(WITHIN_DOCUMENT_GAP, reason);
            }
        }
    }

    /// Position far from where this element usually sits in this source's
    /// documents. Groups with fewer than two samples or no spread never
    /// flag.
    fn check_positional_outliers(&self, records: &mut [ExtractionRecord]) {
        let stats = collect_position_stats(records);

        for record in records.iter_mut() {
            let Some(position) = record.position else {
                continue;
            };
            let key = (record.source.clone(), record.element.clone());
            let Some(group) = stats.get(&key) else {
                continue;
            };
            let Some(z) = group.z_score(position) else {
                continue;
            };
            if z.abs() > self.config.positional_outlier_threshold {
                debug!(
                    source = record.source.as_str(),
                    element = record.element.as_str(),
                    position,
                    z_score = z,
                    "positional outlier"
                );
                record.add_flag(
                    POSITIONAL_OUTLIER,
                    format!(
                        "position {position} is {:.2} standard deviations from the mean {:.1}",
                        z, group.mean,
                    ),
                );
            }
        }
    }
}

/// Group record indices by (source, filename), preserving record order
/// within each document.
fn document_groups(records: &[ExtractionRecord]) -> BTreeMap<(String, String), Vec<usize>> {
    let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        groups
            .entry((record.source.clone(), record.filename.clone()))
            .or_default()
            .push(i);
    }
    groups
}

fn grade(record: &ExtractionRecord) -> Confidence {
    if record.is_missing() {
        Confidence::Missing
    } else if record.flags.is_empty() {
        Confidence::High
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn validator() -> Validator {
        Validator::new(ValidationConfig::default())
    }

    fn record(filename: &str, element: &str, cleaned: &str, order: u32, position: usize) -> ExtractionRecord {
        let mut r = ExtractionRecord::found("TEST", filename, element, cleaned, order, position);
        r.cleaned_value = Some(cleaned.to_string());
        r
    }

    #[test]
    fn test_date_logic_flags_all_three() {
        let mut records = vec![
            record("a.txt", "DOB", "01/15/1990", 1, 100),
            record("a.txt", "DOH", "06/01/1985", 1, 200),
            record("a.txt", "DOTE", "03/20/2020", 1, 300),
        ];
        validator().validate(&mut records);
        for r in &records {
            assert!(r.flags.contains(DATE_LOGIC_VIOLATION), "{} unflagged", r.element);
            assert_eq!(r.confidence, Confidence::Low);
        }
    }

    #[test]
    fn test_date_logic_hire_equal_termination_is_valid() {
        let mut records = vec![
            record("a.txt", "DOB", "01/15/1960", 1, 100),
            record("a.txt", "DOH", "06/01/1985", 1, 200),
            record("a.txt", "DOTE", "06/01/1985", 1, 300),
        ];
        validator().validate(&mut records);
        for r in &records {
            assert!(!r.flags.contains(DATE_LOGIC_VIOLATION));
            assert_eq!(r.confidence, Confidence::High);
        }
    }

    #[test]
    fn test_date_logic_skipped_when_incomplete() {
        let mut records = vec![
            record("a.txt", "DOB", "01/15/1990", 1, 100),
            record("a.txt", "DOH", "06/01/1985", 1, 200),
        ];
        validator().validate(&mut records);
        assert!(records.iter().all(|r| !r.flags.contains(DATE_LOGIC_VIOLATION)));
    }

    #[test]
    fn test_multiple_extractions_flags_every_occurrence() {
        let mut records = vec![
            record("a.txt", "SSN", "123-45-6789", 1, 100),
            record("a.txt", "SSN", "123-45-6789", 2, 400),
        ];
        validator().validate(&mut records);
        assert!(records[0].flags.contains(MULTIPLE_EXTRACTIONS));
        assert!(records[1].flags.contains(MULTIPLE_EXTRACTIONS));
        // Same value, so no conflict on top of it.
        assert!(!records[0].flags.contains(WITHIN_DOCUMENT_CONFLICT));
    }

    #[test]
    fn test_conflict_requires_distinct_cleaned_values() {
        let mut records = vec![
            record("a.txt", "DOB", "01/15/1990", 1, 100),
            record("a.txt", "DOB", "02/20/1991", 2, 150),
        ];
        validator().validate(&mut records);
        assert!(records[0].flags.contains(WITHIN_DOCUMENT_CONFLICT));
        assert!(records[1].flags.contains(WITHIN_DOCUMENT_CONFLICT));
    }

    #[test]
    fn test_gap_flags_both_ends() {
        let mut records = vec![
            record("a.txt", "AMOUNT", "100.00", 1, 100),
            record("a.txt", "AMOUNT", "100.00", 2, 5000),
        ];
        validator().validate(&mut records);
        assert!(records[0].flags.contains(WITHIN_DOCUMENT_GAP));
        assert!(records[1].flags.contains(WITHIN_DOCUMENT_GAP));
    }

    #[test]
    fn test_gap_spans_different_elements() {
        // Adjacency is document-wide: a single occurrence of each element
        // still participates in the gap check.
        let mut records = vec![
            record("a.txt", "DOB", "01/15/1990", 1, 100),
            record("a.txt", "SSN", "123-45-6789", 1, 6000),
        ];
        validator().validate(&mut records);
        assert!(records[0].flags.contains(WITHIN_DOCUMENT_GAP));
        assert!(records[1].flags.contains(WITHIN_DOCUMENT_GAP));
    }

    #[test]
    fn test_gap_within_threshold_not_flagged() {
        let mut records = vec![
            record("a.txt", "AMOUNT", "100.00", 1, 100),
            record("a.txt", "AMOUNT", "100.00", 2, 2100),
        ];
        validator().validate(&mut records);
        assert!(!records[0].flags.contains(WITHIN_DOCUMENT_GAP));
    }

    #[test]
    fn test_positional_outlier_across_documents() {
        let mut records: Vec<ExtractionRecord> = (0..10)
            .map(|i| record(&format!("doc{i}.txt"), "DOB", "01/15/1990", 1, 200))
            .collect();
        records.push(record("doc10.txt", "DOB", "01/15/1990", 1, 900));
        validator().validate(&mut records);

        assert!(records[10].flags.contains(POSITIONAL_OUTLIER));
        assert!(records[..10].iter().all(|r| !r.flags.contains(POSITIONAL_OUTLIER)));
    }

    #[test]
    fn test_outlier_needs_at_least_two_samples() {
        let mut records = vec![record("a.txt", "DOB", "01/15/1990", 1, 900)];
        validator().validate(&mut records);
        assert!(!records[0].flags.contains(POSITIONAL_OUTLIER));
    }

    #[test]
    fn test_confidence_grades() {
        let mut records = vec![
            record("a.txt", "DOB", "01/15/1990", 1, 100),
            ExtractionRecord::missing("TEST", "a.txt", "SSN"),
        ];
        records.push({
            let mut flagged = record("a.txt", "AMOUNT", "5.00", 1, 50);
            flagged.add_flag("normalization_failure", "test");
            flagged
        });
        validator().validate(&mut records);
        assert_eq!(records[0].confidence, Confidence::High);
        assert_eq!(records[1].confidence, Confidence::Missing);
        assert_eq!(records[2].confidence, Confidence::Low);
    }
}
