//! Per-source configuration for the extraction pipeline.
//!
//! A [`SourceConfig`] is loaded once per document type from a TOML file and
//! stays immutable for the run. Patterns are kept as raw strings here and
//! compiled by [`crate::extract::CompiledSource`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clean::CleanerKind;
use crate::error::{ConfigError, Result};

/// One or more ordered regex patterns for a field.
///
/// A field may be configured with a single pattern string or an ordered
/// list; both forms are accepted from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternList {
    /// Single pattern.
    Single(String),
    /// Ordered fallback list.
    Ordered(Vec<String>),
}

impl PatternList {
    /// Patterns in configured order.
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            PatternList::Single(p) => vec![p.as_str()],
            PatternList::Ordered(list) => list.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PatternList::Single(p) => p.is_empty(),
            PatternList::Ordered(list) => list.is_empty(),
        }
    }
}

/// A named field targeted for extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Element name (e.g. `DOB`, `SSN`).
    pub element: String,
    /// Ordered fallback patterns.
    pub patterns: PatternList,
    /// Cleaner kind override. When absent, the cleaner table decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaner: Option<CleanerKind>,
}

/// Which person a name anchor pair refers to.
///
/// The prefix decides the element names the split produces:
/// `Name` → FNAME/LNAME, `Spouse` → SFNAME/SLNAME,
/// `Beneficiary` → BFNAME/BLNAME, `Ap` → APFNAME/APLNAME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NamePrefix {
    #[default]
    Name,
    Spouse,
    Beneficiary,
    Ap,
}

/// First or last component of a split name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    First,
    Last,
}

impl NamePrefix {
    fn letters(&self) -> &'static str {
        match self {
            NamePrefix::Name => "",
            NamePrefix::Spouse => "S",
            NamePrefix::Beneficiary => "B",
            NamePrefix::Ap => "AP",
        }
    }

    /// Element name for an unsplit name record (missing sentinels use this).
    pub fn raw_element(&self) -> String {
        format!("{}NAME", self.letters())
    }

    /// Element name for the first-name component.
    pub fn first_element(&self) -> String {
        format!("{}FNAME", self.letters())
    }

    /// Element name for the last-name component.
    pub fn last_element(&self) -> String {
        format!("{}LNAME", self.letters())
    }

    /// Recognize a split name element (`FNAME`, `SLNAME`, `APFNAME`, ...).
    pub fn parse_component(element: &str) -> Option<(NamePrefix, NamePart)> {
        for prefix in [
            NamePrefix::Ap,
            NamePrefix::Spouse,
            NamePrefix::Beneficiary,
            NamePrefix::Name,
        ] {
            if element == prefix.first_element() {
                return Some((prefix, NamePart::First));
            }
            if element == prefix.last_element() {
                return Some((prefix, NamePart::Last));
            }
        }
        None
    }

    /// Recognize an unsplit name element (`NAME`, `SNAME`, `BNAME`, `APNAME`).
    pub fn parse_raw(element: &str) -> Option<NamePrefix> {
        for prefix in [
            NamePrefix::Ap,
            NamePrefix::Spouse,
            NamePrefix::Beneficiary,
            NamePrefix::Name,
        ] {
            if element == prefix.raw_element() {
                return Some(prefix);
            }
        }
        None
    }
}

/// A (start-anchor, stop-anchor, prefix) triple carving one name span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorPair {
    /// Literal text marking the beginning of the span.
    pub start: String,
    /// Literal text marking the end of the span.
    pub stop: String,
    /// Whose name this pair extracts.
    #[serde(default)]
    pub prefix: NamePrefix,
}

/// Validation thresholds for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Z-score threshold for positional outlier detection.
    pub positional_outlier_threshold: f64,
    /// Maximum character gap between sequential elements in a document.
    pub within_document_gap_threshold: usize,
    /// Two-digit years expanding past this year are shifted back a century.
    pub date_century_cutoff: i32,
    /// Elements every document of this source is expected to contain.
    pub critical_elements: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            positional_outlier_threshold: 3.0,
            within_document_gap_threshold: 2000,
            date_century_cutoff: 2027,
            critical_elements: Vec::new(),
        }
    }
}

/// Immutable configuration for one document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name (matches the document folder name).
    pub source: String,

    /// Fields to extract with regex patterns.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    /// Anchor pairs for name extraction.
    #[serde(default)]
    pub name_anchors: Vec<AnchorPair>,

    /// Rename map for 2nd+ occurrences of an element within one document.
    #[serde(default)]
    pub duplicate_map: BTreeMap<String, String>,

    /// Expect "Last, First" name order.
    #[serde(default)]
    pub reverse_name_order: bool,

    /// Case-insensitive pattern and anchor matching.
    #[serde(default = "default_true")]
    pub case_insensitive: bool,

    /// Explicit element → cleaner assignments overriding the built-in table.
    #[serde(default)]
    pub cleaners: BTreeMap<String, CleanerKind>,

    /// Validation thresholds.
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    /// Minimal configuration for a source with no fields configured yet.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: Vec::new(),
            name_anchors: Vec::new(),
            duplicate_map: BTreeMap::new(),
            reverse_name_order: false,
            case_insensitive: true,
            cleaners: BTreeMap::new(),
            validation: ValidationConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: SourceConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// A source with neither patterns nor anchors has nothing to extract.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.patterns.is_empty()) && self.name_anchors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefix_element_names() {
        assert_eq!(NamePrefix::Name.first_element(), "FNAME");
        assert_eq!(NamePrefix::Name.last_element(), "LNAME");
        assert_eq!(NamePrefix::Spouse.first_element(), "SFNAME");
        assert_eq!(NamePrefix::Beneficiary.last_element(), "BLNAME");
        assert_eq!(NamePrefix::Ap.raw_element(), "APNAME");
    }

    #[test]
    fn test_parse_component_prefers_longer_prefix() {
        // APFNAME must resolve to the AP prefix, not Name with a stray "AP".
        assert_eq!(
            NamePrefix::parse_component("APFNAME"),
            Some((NamePrefix::Ap, NamePart::First))
        );
        assert_eq!(
            NamePrefix::parse_component("LNAME"),
            Some((NamePrefix::Name, NamePart::Last))
        );
        assert_eq!(NamePrefix::parse_component("DOB"), None);
    }

    #[test]
    fn test_single_and_list_patterns_deserialize() {
        let text = r#"
            source = "W2"

            [[fields]]
            element = "SSN"
            patterns = "\\d{3}-\\d{2}-\\d{4}"

            [[fields]]
            element = "DOB"
            patterns = ["\\d{2}/\\d{2}/\\d{4}", "\\d{2}-\\d{2}-\\d{4}"]
            cleaner = "date"
        "#;

        let config: SourceConfig = toml::from_str(text).unwrap();
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[0].patterns.patterns().len(), 1);
        assert_eq!(config.fields[1].patterns.patterns().len(), 2);
        assert!(config.case_insensitive);
        assert_eq!(config.validation.within_document_gap_threshold, 2000);
    }

    #[test]
    fn test_anchor_prefix_defaults_to_name() {
        let text = r#"
            source = "Beneficiary_Form"

            [[name_anchors]]
            start = "Participant:"
            stop = "SSN"

            [[name_anchors]]
            start = "Beneficiary:"
            stop = "Relationship"
            prefix = "beneficiary"
        "#;

        let config: SourceConfig = toml::from_str(text).unwrap();
        assert_eq!(config.name_anchors[0].prefix, NamePrefix::Name);
        assert_eq!(config.name_anchors[1].prefix, NamePrefix::Beneficiary);
    }
}
