//! Anchor-delimited name extraction.
//!
//! Each configured (start, stop, prefix) anchor pair carves one name span
//! out of the document text. Pairs are evaluated independently over the
//! full text; no pair consumes text matched by another.

use tracing::debug;

use super::CompiledAnchor;
use crate::models::config::NamePrefix;
use crate::models::record::ExtractionRecord;

/// Minimum trimmed span length to accept as a name.
const MIN_NAME_LEN: usize = 2;

/// Split a name span into (first, last), uppercased.
///
/// Forward order: first whitespace token is the first name, the remaining
/// tokens joined with single spaces are the last name. Reverse order splits
/// on the first comma with the last name before it; a span without a comma
/// falls back to forward order.
///
/// Returns `None` for an empty span. A single-token span yields an empty
/// last name.
pub fn split_name(span: &str, reverse_order: bool) -> Option<(String, String)> {
    let normalized = span
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    if normalized.is_empty() {
        return None;
    }

    if reverse_order && normalized.contains(',') {
        let (last, first) = normalized.split_once(',').unwrap_or((normalized.as_str(), ""));
        return Some((first.trim().to_string(), last.trim().to_string()));
    }

    let mut tokens = normalized.split(' ');
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    Some((first, last))
}

/// Extract name records from a document using its compiled anchor pairs.
///
/// A successful pair produces two records, `<P>FNAME` and `<P>LNAME`, both
/// carrying the untrimmed span as their raw value and the start-anchor end
/// offset as their position; the cleaned components are filled in by the
/// normalizer. A pair whose start or stop anchor is absent produces one
/// missing sentinel under the prefix's raw element; anchors never raise.
pub fn extract_names(
    text: &str,
    anchors: &[CompiledAnchor],
    reverse_order: bool,
    source: &str,
    filename: &str,
) -> Vec<ExtractionRecord> {
    let mut records = Vec::new();

    for anchor in anchors {
        match carve_span(text, anchor) {
            Some((span, position)) if span.trim().len() >= MIN_NAME_LEN => {
                let Some((first, last)) = split_name(span, reverse_order) else {
                    records.push(missing_for(anchor.prefix, source, filename));
                    continue;
                };

                if !first.is_empty() {
                    records.push(ExtractionRecord::found(
                        source,
                        filename,
                        anchor.prefix.first_element(),
                        span,
                        1,
                        position,
                    ));
                }
                if !last.is_empty() {
                    records.push(ExtractionRecord::found(
                        source,
                        filename,
                        anchor.prefix.last_element(),
                        span,
                        1,
                        position,
                    ));
                }
            }
            Some(_) => {
                debug!(prefix = ?anchor.prefix, "name span too short, treating as missing");
                records.push(missing_for(anchor.prefix, source, filename));
            }
            None => {
                debug!(prefix = ?anchor.prefix, "anchor pair not found");
                records.push(missing_for(anchor.prefix, source, filename));
            }
        }
    }

    assign_orders(&mut records);
    records
}

/// Find the first start anchor and the nearest following stop anchor;
/// the span is the text between them.
fn carve_span<'t>(text: &'t str, anchor: &CompiledAnchor) -> Option<(&'t str, usize)> {
    let start = anchor.start.find(text)?;
    let rest = &text[start.end()..];
    let stop = anchor.stop.find(rest)?;
    let span = &rest[..stop.start()];
    Some((span, start.end()))
}

fn missing_for(prefix: NamePrefix, source: &str, filename: &str) -> ExtractionRecord {
    ExtractionRecord::missing(source, filename, prefix.raw_element())
}

/// Re-number extraction orders per element by ascending position. Needed
/// when several anchor pairs share a prefix and therefore an element name.
fn assign_orders(records: &mut [ExtractionRecord]) {
    let mut elements: Vec<String> = records
        .iter()
        .filter(|r| !r.is_missing())
        .map(|r| r.element.clone())
        .collect();
    elements.sort();
    elements.dedup();

    for element in elements {
        let mut indices: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.element == element && !r.is_missing())
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| records[i].position);
        for (order, &i) in indices.iter().enumerate() {
            records[i].extraction_order = Some((order + 1) as u32);
        }
    }
}
