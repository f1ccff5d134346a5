//! End-to-end pipeline: extract, rename duplicates, normalize, validate.
//!
//! Extraction and normalization are per-document; validation needs the
//! whole corpus, so [`Pipeline::run`] materializes every record before
//! the validator sees any of them.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::clean::{CleanerTable, ValueNormalizer};
use crate::error::{ConfigError, Result};
use crate::extract::{apply_duplicate_map, extract_names, match_field, CompiledSource};
use crate::models::config::SourceConfig;
use crate::models::record::ExtractionRecord;
use crate::validate::Validator;

/// One document's text plus where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub filename: String,
    pub text: String,
}

impl Document {
    pub fn new(
        source: impl Into<String>,
        filename: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            filename: filename.into(),
            text: text.into(),
        }
    }
}

/// A compiled, ready-to-run pipeline for one source type.
#[derive(Debug)]
pub struct Pipeline {
    compiled: CompiledSource,
    normalizer: ValueNormalizer,
    validator: Validator,
}

impl Pipeline {
    /// Build a pipeline from a source configuration. Fails on an empty
    /// repository or a malformed pattern.
    pub fn new(config: SourceConfig) -> Result<Self> {
        if config.is_empty() {
            return Err(ConfigError::EmptyRepository(config.source).into());
        }

        // Field-level cleaner overrides sit on top of the source table,
        // which itself sits on top of the built-in assignments.
        let mut overrides: BTreeMap<String, crate::clean::CleanerKind> = config.cleaners.clone();
        for field in &config.fields {
            if let Some(kind) = field.cleaner {
                overrides.insert(field.element.clone(), kind);
            }
        }
        let table = CleanerTable::with_overrides(&overrides);

        let normalizer = ValueNormalizer::new(
            table,
            config.reverse_name_order,
            config.validation.date_century_cutoff,
        );
        let validator = Validator::new(config.validation.clone());
        let compiled = CompiledSource::compile(config)?;

        info!(
            source = compiled.config.source.as_str(),
            fields = compiled.fields.len(),
            anchors = compiled.anchors.len(),
            "pipeline compiled"
        );

        Ok(Self {
            compiled,
            normalizer,
            validator,
        })
    }

    pub fn source(&self) -> &str {
        &self.compiled.config.source
    }

    /// Extract, rename and normalize one document. The result is NOT yet
    /// validated; callers that want flags and confidence go through
    /// [`Pipeline::run`].
    pub fn process_document(&self, doc: &Document) -> Vec<ExtractionRecord> {
        let mut records = Vec::new();

        for field in &self.compiled.fields {
            records.extend(match_field(&doc.text, field, &doc.source, &doc.filename));
        }
        records.extend(extract_names(
            &doc.text,
            &self.compiled.anchors,
            self.compiled.config.reverse_name_order,
            &doc.source,
            &doc.filename,
        ));

        apply_duplicate_map(&mut records, &self.compiled.config.duplicate_map);

        let records = self.normalizer.normalize_all(records);
        debug!(
            filename = doc.filename.as_str(),
            records = records.len(),
            "document processed"
        );
        records
    }

    /// Process a corpus of documents and validate the combined records.
    pub fn run(&self, documents: &[Document]) -> Result<Vec<ExtractionRecord>> {
        if documents.is_empty() {
            return Err(ConfigError::NoDocuments(self.source().to_string()).into());
        }

        let mut records = Vec::new();
        for doc in documents {
            records.extend(self.process_document(doc));
        }

        self.validator.validate(&mut records);
        info!(
            source = self.source(),
            documents = documents.len(),
            records = records.len(),
            "corpus validated"
        );
        Ok(records)
    }
}

/// Runs a mixed-source corpus against a set of pipelines, one per source.
#[derive(Debug, Default)]
pub struct PlanRunner {
    pipelines: BTreeMap<String, Pipeline>,
}

impl PlanRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, config: SourceConfig) -> Result<()> {
        let pipeline = Pipeline::new(config)?;
        self.pipelines.insert(pipeline.source().to_string(), pipeline);
        Ok(())
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    /// Run every document against its source's pipeline. A document whose
    /// source has no configured pipeline is a fatal error, not a skip.
    pub fn run(&self, documents: &[Document]) -> Result<Vec<ExtractionRecord>> {
        let mut by_source: BTreeMap<&str, Vec<Document>> = BTreeMap::new();
        for doc in documents {
            by_source.entry(doc.source.as_str()).or_default().push(doc.clone());
        }

        let mut records = Vec::new();
        for (source, docs) in &by_source {
            let pipeline = self
                .pipelines
                .get(*source)
                .ok_or_else(|| ConfigError::MissingSource(source.to_string()))?;
            records.extend(pipeline.run(docs)?);
        }
        Ok(records)
    }
}
