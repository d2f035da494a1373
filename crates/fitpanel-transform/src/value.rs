//! Numeric and boolean cell coercion.

/// Parses a numeric cell.
///
/// Tolerates surrounding whitespace and thousands separators
/// (`"1,234"`, `"1 234"`, non-breaking spaces). Returns `None` for empty cells,
/// non-numeric text and non-finite values.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = trimmed
        .replace(',', "")
        .replace(' ', "")
        .replace('\u{a0}', "");

    cleaned.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

/// Parses a boolean cell: `true/false/1/0/yes/no`, case-insensitive.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_numbers() {
        assert_eq!(parse_numeric("123"), Some(123.0));
        assert_eq!(parse_numeric("-0.5"), Some(-0.5));
        assert_eq!(parse_numeric("1.23e2"), Some(123.0));
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(parse_numeric("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_numeric(" 1 234.5 "), Some(1234.5));
        assert_eq!(parse_numeric("12\u{a0}000"), Some(12_000.0));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("   "), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag(" YES "), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("No"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }
}
