//! String and passthrough normalization.

/// Normalize a free-text value: keep only letters, digits, space, hyphen
/// and apostrophe; uppercase; collapse whitespace runs; trim. An input
/// left empty by the filter counts as a normalization failure.
pub fn clean_string(raw: &str) -> Option<String> {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '\'') || c.is_whitespace())
        .collect();

    let cleaned = filtered
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Keep a value as-is apart from outer whitespace.
pub fn clean_passthrough(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_string_filters_and_uppercases() {
        assert_eq!(
            clean_string("O'Brien-Smith #42!").as_deref(),
            Some("O'BRIEN-SMITH 42")
        );
    }

    #[test]
    fn test_clean_string_collapses_whitespace() {
        assert_eq!(
            clean_string("  123  45   6789 ").as_deref(),
            Some("123 45 6789")
        );
    }

    #[test]
    fn test_clean_string_empty_after_filter() {
        assert_eq!(clean_string("@#$!"), None);
        assert_eq!(clean_string("   "), None);
    }

    #[test]
    fn test_passthrough_trims_only() {
        assert_eq!(clean_passthrough("  keep: This/As-Is  "), "keep: This/As-Is");
    }
}
