//! Currency, percentage and decimal normalization.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Normalize a dollar amount: strip `$`, thousands separators and
/// whitespace; parenthesized or minus-prefixed amounts become negative.
/// Always rendered with exactly two decimal digits, so already-canonical
/// input round-trips unchanged.
pub fn clean_dollar(raw: &str) -> Option<String> {
    let is_parenthesized = raw.contains('(');
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '(' | ')') && !c.is_whitespace())
        .collect();

    let is_negative = is_parenthesized || stripped.starts_with('-');
    let unsigned = stripped.trim_start_matches('-');

    let amount = Decimal::from_str(unsigned).ok()?;
    let amount = if is_negative { -amount } else { amount };
    Some(format!("{:.2}", amount))
}

/// Normalize a percentage: strip `%`, thousands separators and whitespace,
/// divide by 100, and render without forced trailing zeros.
pub fn clean_percentage(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '%' | ',') && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&stripped).ok()?;
    let fraction = value / Decimal::ONE_HUNDRED;
    Some(fraction.normalize().to_string())
}

/// Normalize a plain number: strip thousands separators and whitespace
/// only, preserving the input's decimal precision.
pub fn clean_decimal(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&stripped).ok()?;
    Some(value.to_string())
}
