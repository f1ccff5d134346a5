//! Extraction record data model.
//!
//! An [`ExtractionRecord`] is created by the extraction stage with the raw
//! fields populated, gains `cleaned_value` during normalization, and gains
//! flags and a confidence level during validation. Its terminal state is
//! read-only and handed to the output boundary.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reliability classification of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    /// Value present, no flags raised.
    High,
    /// Value present but at least one flag raised.
    Low,
    /// No value was extracted.
    Missing,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Low => write!(f, "LOW"),
            Confidence::Missing => write!(f, "MISSING"),
        }
    }
}

/// One extracted (or missing) field occurrence from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Document type the record came from (folder name).
    pub source: String,
    /// Document file name.
    pub filename: String,
    /// Element name (may be renamed by the duplicate mapper or the name
    /// split).
    pub element: String,
    /// Raw matched text. `None` marks the missing sentinel.
    pub value: Option<String>,
    /// 1-based occurrence number within the (document, element) group,
    /// increasing with position.
    pub extraction_order: Option<u32>,
    /// Start offset of the match in the document text.
    pub position: Option<usize>,
    /// Canonical value produced by the normalizer.
    pub cleaned_value: Option<String>,
    /// Validation flags. Only ever grows.
    pub flags: BTreeSet<String>,
    /// Human-readable reason per flag. Existing reasons are never
    /// overwritten.
    pub flag_reasons: BTreeMap<String, String>,
    /// Derived confidence level.
    pub confidence: Confidence,
}

impl ExtractionRecord {
    /// Create a record for a successful match.
    pub fn found(
        source: impl Into<String>,
        filename: impl Into<String>,
        element: impl Into<String>,
        value: impl Into<String>,
        extraction_order: u32,
        position: usize,
    ) -> Self {
        Self {
            source: source.into(),
            filename: filename.into(),
            element: element.into(),
            value: Some(value.into()),
            extraction_order: Some(extraction_order),
            position: Some(position),
            cleaned_value: None,
            flags: BTreeSet::new(),
            flag_reasons: BTreeMap::new(),
            confidence: Confidence::Missing,
        }
    }

    /// Create the missing sentinel for an element with no match.
    pub fn missing(
        source: impl Into<String>,
        filename: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            filename: filename.into(),
            element: element.into(),
            value: None,
            extraction_order: None,
            position: None,
            cleaned_value: None,
            flags: BTreeSet::new(),
            flag_reasons: BTreeMap::new(),
            confidence: Confidence::Missing,
        }
    }

    /// True when no value was extracted.
    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }

    /// Attach a flag with its reason. Flags accumulate as a set union;
    /// a reason already recorded for the flag is kept.
    pub fn add_flag(&mut self, flag: impl Into<String>, reason: impl Into<String>) {
        let flag = flag.into();
        self.flag_reasons.entry(flag.clone()).or_insert_with(|| reason.into());
        self.flags.insert(flag);
    }
}

/// Flattened row for the tabular output boundary.
///
/// Column order and the flag/reason join formats match what the report
/// and statistics collaborators consume.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRow {
    pub source: String,
    pub filename: String,
    pub element: String,
    pub value: String,
    pub cleaned_value: String,
    pub extraction_order: String,
    pub extraction_position: String,
    pub flags: String,
    pub flag_reasons: String,
    pub confidence: String,
}

impl From<&ExtractionRecord> for OutputRow {
    fn from(record: &ExtractionRecord) -> Self {
        let flags = record
            .flags
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let flag_reasons = record
            .flag_reasons
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(" | ");

        Self {
            source: record.source.clone(),
            filename: record.filename.clone(),
            element: record.element.clone(),
            value: record.value.clone().unwrap_or_default(),
            cleaned_value: record.cleaned_value.clone().unwrap_or_default(),
            extraction_order: record
                .extraction_order
                .map(|o| o.to_string())
                .unwrap_or_default(),
            extraction_position: record
                .position
                .map(|p| p.to_string())
                .unwrap_or_default(),
            flags,
            flag_reasons,
            confidence: record.confidence.to_string(),
        }
    }
}
