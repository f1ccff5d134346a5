//! Value normalization: cleaner kinds, kind resolution, and the
//! record-level normalizer with smart overrides and name fan-out.

pub mod amounts;
pub mod dates;
pub mod strings;

pub use amounts::{clean_decimal, clean_dollar, clean_percentage};
pub use dates::{clean_date, parse_canonical};
pub use strings::{clean_passthrough, clean_string};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::split_name;
use crate::models::config::{NamePart, NamePrefix};
use crate::models::record::ExtractionRecord;

/// Flag attached when a value cannot be normalized; the raw value passes
/// through unchanged.
pub const NORMALIZATION_FAILURE: &str = "normalization_failure";

/// The cleaning rule applied to a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanerKind {
    /// Canonical `MM/DD/YYYY` with century cutoff.
    Date,
    /// Currency to two decimal places.
    Dollar,
    /// Percentage to a fraction.
    Percentage,
    /// Plain number, precision preserved.
    Decimal,
    /// Uppercased, filtered text.
    String,
    /// First/last split, fans one record into two.
    Name,
    /// Trim only.
    Passthrough,
}

impl fmt::Display for CleanerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CleanerKind::Date => "date",
            CleanerKind::Dollar => "dollar",
            CleanerKind::Percentage => "percentage",
            CleanerKind::Decimal => "decimal",
            CleanerKind::String => "string",
            CleanerKind::Name => "name",
            CleanerKind::Passthrough => "passthrough",
        };
        write!(f, "{name}")
    }
}

/// Keyword fallback table: an element whose name contains one of the
/// keywords gets the kind. Evaluated in order after the explicit map.
const KEYWORD_FALLBACK: &[(CleanerKind, &[&str])] = &[
    (
        CleanerKind::Date,
        &[
            "DATE", "DOB", "DOH", "DOTE", "BIRTH", "HIRE", "TERMINATION", "EFFECTIVE",
            "EXPIRATION", "ISSUE",
        ],
    ),
    (
        CleanerKind::Dollar,
        &[
            "AMOUNT", "SALARY", "WAGE", "PAY", "BONUS", "COMMISSION", "COMPENSATION", "BENEFIT",
        ],
    ),
    (CleanerKind::Percentage, &["PERCENT", "PCT", "RATE", "%"]),
    (
        CleanerKind::Decimal,
        &["NUMBER", "HOURS", "DAYS", "WEEKS", "MONTHS", "QUANTITY", "COUNT"],
    ),
    (CleanerKind::Name, &["NAME"]),
    (
        CleanerKind::String,
        &["SSN", "PHONE", "ZIP", "ID", "CODE"],
    ),
];

/// Built-in explicit assignments for common elements.
fn builtin_assignments() -> BTreeMap<String, CleanerKind> {
    let entries: &[(&str, CleanerKind)] = &[
        ("DOB", CleanerKind::Date),
        ("DOH", CleanerKind::Date),
        ("DOTE", CleanerKind::Date),
        ("DATE", CleanerKind::Date),
        ("EFFECTIVE_DATE", CleanerKind::Date),
        ("DATE_SIGNED", CleanerKind::Date),
        ("AMOUNT", CleanerKind::Dollar),
        ("SALARY", CleanerKind::Dollar),
        ("WAGE", CleanerKind::Dollar),
        ("HOURLY_RATE", CleanerKind::Dollar),
        ("ANNUAL_SALARY", CleanerKind::Dollar),
        ("PERCENTAGE", CleanerKind::Percentage),
        ("INTEREST_RATE", CleanerKind::Percentage),
        ("TAX_RATE", CleanerKind::Percentage),
        ("HOURS", CleanerKind::Decimal),
        ("QUANTITY", CleanerKind::Decimal),
        ("SSN", CleanerKind::String),
        ("EMPLOYEE_ID", CleanerKind::String),
        ("POLICY_NUMBER", CleanerKind::String),
        ("PHONE", CleanerKind::String),
        ("ZIP", CleanerKind::String),
        ("STATE", CleanerKind::String),
        ("NAME", CleanerKind::Name),
        ("FULL_NAME", CleanerKind::Name),
        ("EMPLOYEE_NAME", CleanerKind::Name),
        ("EMAIL", CleanerKind::Passthrough),
        ("URL", CleanerKind::Passthrough),
        ("ADDRESS", CleanerKind::Passthrough),
        ("NOTES", CleanerKind::Passthrough),
    ];
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

/// Element → cleaner-kind resolution: explicit map, then keyword
/// substrings, then `string`.
#[derive(Debug, Clone)]
pub struct CleanerTable {
    assignments: BTreeMap<String, CleanerKind>,
}

impl Default for CleanerTable {
    fn default() -> Self {
        Self {
            assignments: builtin_assignments(),
        }
    }
}

impl CleanerTable {
    /// The built-in table with extra explicit assignments layered on top.
    /// Later maps win over earlier ones; all keys are uppercased.
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a CleanerKind)>,
    {
        let mut table = Self::default();
        for (element, kind) in overrides {
            table.assignments.insert(element.to_uppercase(), *kind);
        }
        table
    }

    /// Resolve the cleaner kind for an element.
    pub fn resolve(&self, element: &str) -> CleanerKind {
        let upper = element.to_uppercase();

        if let Some(kind) = self.assignments.get(&upper) {
            return *kind;
        }

        for (kind, keywords) in KEYWORD_FALLBACK {
            if keywords.iter().any(|kw| upper.contains(kw)) {
                return *kind;
            }
        }

        CleanerKind::String
    }
}

/// Applies the resolved cleaner to each record, with smart overrides for
/// misclassified numeric fields and fan-out for unsplit name records.
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    table: CleanerTable,
    reverse_name_order: bool,
    century_cutoff: i32,
}

impl ValueNormalizer {
    pub fn new(table: CleanerTable, reverse_name_order: bool, century_cutoff: i32) -> Self {
        Self {
            table,
            reverse_name_order,
            century_cutoff,
        }
    }

    /// Normalize a whole document's records. Name fan-out can grow the
    /// collection; order is otherwise preserved.
    pub fn normalize_all(&self, records: Vec<ExtractionRecord>) -> Vec<ExtractionRecord> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.extend(self.normalize_record(record));
        }
        out
    }

    /// Normalize one record.
    ///
    /// Missing sentinels bypass every cleaner. An unsplit name record is
    /// replaced by its `<P>FNAME`/`<P>LNAME` pair; everything else maps
    /// one-to-one. Unparsable values pass through with a
    /// `normalization_failure` flag, never an error.
    pub fn normalize_record(&self, mut record: ExtractionRecord) -> Vec<ExtractionRecord> {
        let Some(raw) = record.value.clone() else {
            return vec![record];
        };

        // Records the name extractor already split: fill in the component.
        if let Some((_, part)) = NamePrefix::parse_component(&record.element) {
            match split_name(&raw, self.reverse_name_order) {
                Some((first, last)) => {
                    let component = match part {
                        NamePart::First => first,
                        NamePart::Last => last,
                    };
                    if component.is_empty() {
                        self.fail(&mut record, &raw, CleanerKind::Name);
                    } else {
                        record.cleaned_value = Some(component);
                    }
                }
                None => self.fail(&mut record, &raw, CleanerKind::Name),
            }
            return vec![record];
        }

        let kind = self.table.resolve(&record.element);

        if kind == CleanerKind::Name {
            return self.fan_out_name(record, &raw);
        }

        let effective = self.effective_kind(kind, &raw);
        if effective != kind {
            debug!(
                element = record.element.as_str(),
                assigned = %kind,
                applied = %effective,
                "cleaner kind overridden by value shape"
            );
        }

        let cleaned = match effective {
            CleanerKind::Date => clean_date(&raw, self.century_cutoff),
            CleanerKind::Dollar => clean_dollar(&raw),
            CleanerKind::Percentage => clean_percentage(&raw),
            CleanerKind::Decimal => clean_decimal(&raw),
            CleanerKind::String => clean_string(&raw),
            CleanerKind::Passthrough => Some(clean_passthrough(&raw)),
            CleanerKind::Name => unreachable!("name kind handled above"),
        };

        match cleaned {
            Some(value) => record.cleaned_value = Some(value),
            None => self.fail(&mut record, &raw, effective),
        }
        vec![record]
    }

    /// Currency, percentage and plain-numeric fields are frequently
    /// misclassified by keyword heuristics alone; the value's own shape
    /// decides.
    fn effective_kind(&self, kind: CleanerKind, raw: &str) -> CleanerKind {
        match kind {
            CleanerKind::Passthrough => kind,
            _ if raw.contains('%') => CleanerKind::Percentage,
            CleanerKind::Dollar if !raw.contains('$') => CleanerKind::Decimal,
            CleanerKind::Percentage => CleanerKind::Decimal,
            _ => kind,
        }
    }

    /// Replace an unsplit name record with its first/last components, both
    /// inheriting the raw value and position metadata.
    fn fan_out_name(&self, record: ExtractionRecord, raw: &str) -> Vec<ExtractionRecord> {
        let prefix = NamePrefix::parse_raw(&record.element).unwrap_or_default();

        let Some((first, last)) = split_name(raw, self.reverse_name_order) else {
            let mut failed = record;
            self.fail(&mut failed, raw, CleanerKind::Name);
            return vec![failed];
        };

        let mut out = Vec::with_capacity(2);
        if !first.is_empty() {
            let mut derived = record.clone();
            derived.element = prefix.first_element();
            derived.cleaned_value = Some(first);
            out.push(derived);
        }
        if !last.is_empty() {
            let mut derived = record.clone();
            derived.element = prefix.last_element();
            derived.cleaned_value = Some(last);
            out.push(derived);
        }

        if out.is_empty() {
            let mut failed = record;
            self.fail(&mut failed, raw, CleanerKind::Name);
            return vec![failed];
        }
        out
    }

    fn fail(&self, record: &mut ExtractionRecord, raw: &str, kind: CleanerKind) {
        debug!(
            element = record.element.as_str(),
            raw,
            cleaner = %kind,
            "normalization failed, passing raw value through"
        );
        record.cleaned_value = Some(raw.to_string());
        record.add_flag(
            NORMALIZATION_FAILURE,
            format!("'{raw}' could not be normalized by the {kind} cleaner"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalizer() -> ValueNormalizer {
        ValueNormalizer::new(CleanerTable::default(), false, 2027)
    }

    fn record(element: &str, value: &str) -> ExtractionRecord {
        ExtractionRecord::found("TEST", "doc.txt", element, value, 1, 50)
    }

    #[test]
    fn test_resolution_explicit_then_keyword_then_default() {
        let table = CleanerTable::default();
        assert_eq!(table.resolve("DOB"), CleanerKind::Date);
        // Not in the explicit map; "HIRE" keyword applies.
        assert_eq!(table.resolve("REHIRE_DAY"), CleanerKind::Date);
        // No keyword matches at all.
        assert_eq!(table.resolve("WIDGET"), CleanerKind::String);
    }

    #[test]
    fn test_resolution_overrides_win() {
        let overrides = BTreeMap::from([("DOB".to_string(), CleanerKind::Passthrough)]);
        let table = CleanerTable::with_overrides(&overrides);
        assert_eq!(table.resolve("DOB"), CleanerKind::Passthrough);
        assert_eq!(table.resolve("DOH"), CleanerKind::Date);
    }

    #[test]
    fn test_date_normalization() {
        let out = normalizer().normalize_record(record("DOB", "01/15/90"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cleaned_value.as_deref(), Some("01/15/1990"));
        assert!(out[0].flags.is_empty());
    }

    #[test]
    fn test_unparsable_date_passes_through_with_flag() {
        let out = normalizer().normalize_record(record("DOB", "sometime in spring"));
        assert_eq!(out[0].cleaned_value.as_deref(), Some("sometime in spring"));
        assert!(out[0].flags.contains(NORMALIZATION_FAILURE));
    }

    #[test]
    fn test_percent_override_regardless_of_kind() {
        // SALARY resolves to dollar, but the value shape wins.
        let out = normalizer().normalize_record(record("SALARY", "50%"));
        assert_eq!(out[0].cleaned_value.as_deref(), Some("0.5"));
    }

    #[test]
    fn test_dollar_without_sign_falls_back_to_decimal() {
        let out = normalizer().normalize_record(record("SALARY", "1,234.50"));
        assert_eq!(out[0].cleaned_value.as_deref(), Some("1234.50"));

        let out = normalizer().normalize_record(record("SALARY", "$1,234.50"));
        assert_eq!(out[0].cleaned_value.as_deref(), Some("1234.50"));
    }

    #[test]
    fn test_name_fan_out() {
        let out = normalizer().normalize_record(record("NAME", "John Smith"));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].element, "FNAME");
        assert_eq!(out[0].cleaned_value.as_deref(), Some("JOHN"));
        assert_eq!(out[1].element, "LNAME");
        assert_eq!(out[1].cleaned_value.as_deref(), Some("SMITH"));
        // Both keep the original raw value and position metadata.
        assert_eq!(out[0].value.as_deref(), Some("John Smith"));
        assert_eq!(out[1].value.as_deref(), Some("John Smith"));
        assert_eq!(out[0].position, Some(50));
    }

    #[test]
    fn test_name_fan_out_reverse_order() {
        let normalizer = ValueNormalizer::new(CleanerTable::default(), true, 2027);
        let out = normalizer.normalize_record(record("NAME", "Smith, John"));
        assert_eq!(out[0].cleaned_value.as_deref(), Some("JOHN"));
        assert_eq!(out[1].cleaned_value.as_deref(), Some("SMITH"));
    }

    #[test]
    fn test_prefixed_name_fan_out() {
        let out = normalizer().normalize_record(record("BNAME", "Jane Doe"));
        assert_eq!(out[0].element, "BFNAME");
        assert_eq!(out[1].element, "BLNAME");
    }

    #[test]
    fn test_split_component_fill() {
        // A record the name extractor already split gets its component.
        let out = normalizer().normalize_record(record("SLNAME", " Jane  Doe "));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].element, "SLNAME");
        assert_eq!(out[0].cleaned_value.as_deref(), Some("DOE"));
    }

    #[test]
    fn test_missing_record_bypasses_cleaners() {
        let missing = ExtractionRecord::missing("TEST", "doc.txt", "DOB");
        let out = normalizer().normalize_record(missing);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cleaned_value, None);
        assert!(out[0].flags.is_empty());
    }

    #[test]
    fn test_string_cleaner_default() {
        let out = normalizer().normalize_record(record("WIDGET", "  ab#c  d "));
        assert_eq!(out[0].cleaned_value.as_deref(), Some("ABC D"));
    }
}
