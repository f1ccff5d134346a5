//! Multi-pattern field matching with ordered fallback.

use tracing::debug;

use super::CompiledField;
use crate::models::record::ExtractionRecord;

/// Run a field's ordered pattern list over a document's text.
///
/// Patterns are fallback alternatives, not merged: the first pattern that
/// yields at least one match anywhere in the text wins and later patterns
/// are never tried. Matches from the winning pattern are ordered by start
/// offset and numbered 1..n.
///
/// Zero matches across the whole list (including an empty list) produce a
/// single missing-sentinel record so the element is never silently dropped.
pub fn match_field(
    text: &str,
    field: &CompiledField,
    source: &str,
    filename: &str,
) -> Vec<ExtractionRecord> {
    for (index, regex) in field.regexes.iter().enumerate() {
        let mut matches: Vec<(usize, String)> = regex
            .find_iter(text)
            .map(|m| (m.start(), m.as_str().to_string()))
            .collect();

        if matches.is_empty() {
            continue;
        }

        // find_iter already walks left to right; keep the sort as the
        // ordering contract rather than an iterator detail.
        matches.sort_by_key(|(start, _)| *start);

        debug!(
            element = field.element.as_str(),
            pattern_index = index,
            count = matches.len(),
            "pattern matched"
        );

        return matches
            .into_iter()
            .enumerate()
            .map(|(i, (start, value))| {
                ExtractionRecord::found(
                    source,
                    filename,
                    &field.element,
                    value,
                    (i + 1) as u32,
                    start,
                )
            })
            .collect();
    }

    debug!(element = field.element.as_str(), "no pattern matched");
    vec![ExtractionRecord::missing(source, filename, &field.element)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::CompiledSource;
    use crate::models::config::{FieldSpec, PatternList, SourceConfig};
    use pretty_assertions::assert_eq;

    fn compile_field(element: &str, patterns: Vec<&str>) -> CompiledField {
        let mut config = SourceConfig::new("TEST");
        config.fields.push(FieldSpec {
            element: element.to_string(),
            patterns: PatternList::Ordered(patterns.into_iter().map(String::from).collect()),
            cleaner: None,
        });
        CompiledSource::compile(config).unwrap().fields.remove(0)
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let field = compile_field(
            "DATE",
            vec![r"\d{2}/\d{2}/\d{4}", r"\d{4}-\d{2}-\d{2}"],
        );
        // Both formats are present; only slash dates may be returned.
        let text = "issued 01/15/1990 and also 2001-02-03 then 12/31/2001";

        let records = match_field(text, &field, "TEST", "doc.txt");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value.as_deref(), Some("01/15/1990"));
        assert_eq!(records[1].value.as_deref(), Some("12/31/2001"));
    }

    #[test]
    fn test_fallback_to_later_pattern() {
        let field = compile_field(
            "DATE",
            vec![r"\d{2}/\d{2}/\d{4}", r"\d{4}-\d{2}-\d{2}"],
        );
        let records = match_field("issued 2001-02-03", &field, "TEST", "doc.txt");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value.as_deref(), Some("2001-02-03"));
        assert_eq!(records[0].extraction_order, Some(1));
    }

    #[test]
    fn test_orders_are_contiguous_and_position_sorted() {
        let field = compile_field("NUM", vec![r"\d+"]);
        let records = match_field("a 12 b 7 c 400", &field, "TEST", "doc.txt");

        assert_eq!(records.len(), 3);
        let orders: Vec<u32> = records.iter().filter_map(|r| r.extraction_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        let positions: Vec<usize> = records.iter().filter_map(|r| r.position).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_match_yields_missing_sentinel() {
        let field = compile_field("SSN", vec![r"\d{3}-\d{2}-\d{4}"]);
        let records = match_field("no identifiers here", &field, "TEST", "doc.txt");

        assert_eq!(records.len(), 1);
        assert!(records[0].is_missing());
        assert_eq!(records[0].element, "SSN");
    }

    #[test]
    fn test_empty_pattern_list_yields_missing_sentinel() {
        let field = compile_field("EMPTY", vec![]);
        let records = match_field("anything", &field, "TEST", "doc.txt");

        assert_eq!(records.len(), 1);
        assert!(records[0].is_missing());
    }
}
