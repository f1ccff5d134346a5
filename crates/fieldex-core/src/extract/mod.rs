//! Extraction stage: compiled field patterns, anchor-based name spans,
//! and duplicate-occurrence renaming.

pub mod duplicates;
pub mod names;
pub mod patterns;

pub use duplicates::apply_duplicate_map;
pub use names::{extract_names, split_name};
pub use patterns::match_field;

use regex::{Regex, RegexBuilder};

use crate::clean::CleanerKind;
use crate::error::{PatternError, Result};
use crate::models::config::{NamePrefix, SourceConfig};

/// A field with its patterns compiled and ready to run.
#[derive(Debug)]
pub struct CompiledField {
    pub element: String,
    /// Ordered fallback alternatives; the first with a match wins.
    pub regexes: Vec<Regex>,
    pub cleaner: Option<CleanerKind>,
}

/// An anchor pair with its literal markers compiled for search.
#[derive(Debug)]
pub struct CompiledAnchor {
    pub start: Regex,
    pub stop: Regex,
    pub prefix: NamePrefix,
}

/// A [`SourceConfig`] with every pattern and anchor compiled once.
///
/// Compilation is the only place a malformed pattern can surface; it is
/// fatal for the source rather than silently skipped mid-extraction.
#[derive(Debug)]
pub struct CompiledSource {
    pub config: SourceConfig,
    pub fields: Vec<CompiledField>,
    pub anchors: Vec<CompiledAnchor>,
}

impl CompiledSource {
    /// Compile all patterns and anchors of a source configuration.
    pub fn compile(config: SourceConfig) -> Result<Self> {
        let case_insensitive = config.case_insensitive;

        let mut fields = Vec::with_capacity(config.fields.len());
        for spec in &config.fields {
            let mut regexes = Vec::new();
            for (index, pattern) in spec.patterns.patterns().into_iter().enumerate() {
                let regex = build_regex(pattern, case_insensitive).map_err(|e| PatternError {
                    source_name: config.source.clone(),
                    element: spec.element.clone(),
                    index,
                    reason: e.to_string(),
                })?;
                regexes.push(regex);
            }
            fields.push(CompiledField {
                element: spec.element.clone(),
                regexes,
                cleaner: spec.cleaner,
            });
        }

        let mut anchors = Vec::with_capacity(config.name_anchors.len());
        for (index, pair) in config.name_anchors.iter().enumerate() {
            // Anchors are literal text, escaped before compilation.
            let start =
                build_regex(&regex::escape(&pair.start), case_insensitive).map_err(|e| {
                    PatternError {
                        source_name: config.source.clone(),
                        element: pair.prefix.raw_element(),
                        index,
                        reason: e.to_string(),
                    }
                })?;
            let stop =
                build_regex(&regex::escape(&pair.stop), case_insensitive).map_err(|e| {
                    PatternError {
                        source_name: config.source.clone(),
                        element: pair.prefix.raw_element(),
                        index,
                        reason: e.to_string(),
                    }
                })?;
            anchors.push(CompiledAnchor {
                start,
                stop,
                prefix: pair.prefix,
            });
        }

        Ok(Self {
            config,
            fields,
            anchors,
        })
    }
}

fn build_regex(pattern: &str, case_insensitive: bool) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .multi_line(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldexError;
    use crate::models::config::{FieldSpec, PatternList};

    #[test]
    fn test_compile_reports_field_and_index() {
        let mut config = SourceConfig::new("W2");
        config.fields.push(FieldSpec {
            element: "SSN".to_string(),
            patterns: PatternList::Ordered(vec![
                r"\d{3}-\d{2}-\d{4}".to_string(),
                r"[unclosed".to_string(),
            ]),
            cleaner: None,
        });

        let err = CompiledSource::compile(config).unwrap_err();
        match err {
            FieldexError::Pattern(p) => {
                assert_eq!(p.source_name, "W2");
                assert_eq!(p.element, "SSN");
                assert_eq!(p.index, 1);
            }
            other => panic!("expected pattern error, got {other}"),
        }
    }

    #[test]
    fn test_compile_honors_case_flag() {
        let mut config = SourceConfig::new("W2");
        config.case_insensitive = true;
        config.fields.push(FieldSpec {
            element: "STATUS".to_string(),
            patterns: PatternList::Single("active".to_string()),
            cleaner: None,
        });

        let compiled = CompiledSource::compile(config).unwrap();
        assert!(compiled.fields[0].regexes[0].is_match("Status: ACTIVE"));
    }
}
