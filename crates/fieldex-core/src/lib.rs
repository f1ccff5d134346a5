//! Rule-based field extraction from OCR'd document text.
//!
//! A source configuration describes which elements to pull from a
//! document type: ordered regex patterns per field, anchor pairs for
//! person names, and a duplicate rename map. The pipeline extracts raw
//! values with their positions, normalizes them (dates, currency,
//! percentages, names), and validates the corpus, grading each record
//! HIGH, LOW, or MISSING.
//!
//! ```no_run
//! use fieldex_core::models::SourceConfig;
//! use fieldex_core::pipeline::{Document, Pipeline};
//!
//! # fn main() -> fieldex_core::Result<()> {
//! let config = SourceConfig::from_file("configs/w2.toml".as_ref())?;
//! let pipeline = Pipeline::new(config)?;
//! let docs = vec![Document::new("W2", "alice.txt", "Employee: ...")];
//! let records = pipeline.run(&docs)?;
//! # Ok(())
//! # }
//! ```

pub mod clean;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod stats;
pub mod validate;

pub use error::{ConfigError, FieldexError, PatternError, Result};
pub use models::{Confidence, ExtractionRecord, OutputRow, SourceConfig};
pub use pipeline::{Document, Pipeline, PlanRunner};
pub use stats::SourceStats;
pub use validate::Validator;
