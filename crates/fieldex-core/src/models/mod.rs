//! Data models: extraction records and source configuration.

pub mod config;
pub mod record;

pub use config::{
    AnchorPair, FieldSpec, NamePart, NamePrefix, PatternList, SourceConfig, ValidationConfig,
};
pub use record::{Confidence, ExtractionRecord, OutputRow};
