//! Duplicate-occurrence renaming.
//!
//! Some document types legitimately contain a field twice (the second DOB
//! on a joint form is the spouse's). The duplicate map renames the 2nd and
//! later occurrences of configured elements so the normalizer and validator
//! see them under their own names.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::record::ExtractionRecord;

/// Rename every record whose element is a key in the map and whose
/// extraction order is 2 or higher. Order-1 records and unmapped elements
/// are left untouched; unmapped repeats stay visible to the validator's
/// `multiple_extractions` check.
///
/// Must run after extraction and before normalization: the cleaner lookup
/// is keyed by the renamed element.
pub fn apply_duplicate_map(
    records: &mut [ExtractionRecord],
    duplicate_map: &BTreeMap<String, String>,
) {
    if duplicate_map.is_empty() {
        return;
    }

    for record in records.iter_mut() {
        let Some(order) = record.extraction_order else {
            continue;
        };
        if order < 2 {
            continue;
        }
        if let Some(renamed) = duplicate_map.get(&record.element) {
            debug!(
                from = record.element.as_str(),
                to = renamed.as_str(),
                order,
                "renaming duplicate occurrence"
            );
            record.element = renamed.clone();
        }
    }
}
