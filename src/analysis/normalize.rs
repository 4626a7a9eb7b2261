//! Normalization of raw contact attributes into grouping keys.
//!
//! All functions here are total: unusable input yields `None`.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Earliest birth year accepted.
pub const MIN_BIRTH_YEAR: i32 = 1950;

/// Latest birth year accepted.
pub const MAX_BIRTH_YEAR: i32 = 2012;

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(19[5-9]\d|20[0-4]\d)").expect("Invalid year pattern"));

static QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[“”"]"#).expect("Invalid quote pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace pattern"));

// Campus qualifier, e.g. "..., sede di Modena".
static CAMPUS_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i), sede di .+$").expect("Invalid campus pattern"));

/// Render an attribute value as text.
///
/// Strings pass through, numbers and `true` use their display form.
/// Empty strings, zero, `false`, null, arrays and objects count as unset.
pub fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some(true.to_string()),
        _ => None,
    }
}

/// Turn a free-text institution name into a comparable key.
///
/// Applies NFKC, drops quotation marks, collapses whitespace and strips a
/// trailing campus qualifier.
pub fn normalize_institution_name(raw: &str) -> Option<String> {
    let composed: String = raw.nfkc().collect();
    let unquoted = QUOTES.replace_all(&composed, "");
    let collapsed = WHITESPACE_RUN.replace_all(&unquoted, " ");
    let stripped = CAMPUS_SUFFIX.replace(collapsed.trim(), "");
    let name = stripped.trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Course names are only trimmed.
pub fn normalize_course_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Find a plausible birth year anywhere in a date-like value.
///
/// Matches the first four-digit run in 1950..=2049, then rejects anything
/// after [`MAX_BIRTH_YEAR`]. Works for `YYYY-MM-DD`, `DD/MM/YYYY`, bare
/// years and similar layouts.
pub fn extract_birth_year(raw: &str) -> Option<i32> {
    let found = YEAR_PATTERN.find(raw.trim())?;
    let year: i32 = found.as_str().parse().ok()?;

    (MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR)
        .contains(&year)
        .then_some(year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_birth_year_formats() {
        assert_eq!(extract_birth_year("1998-05-01"), Some(1998));
        assert_eq!(extract_birth_year("01/05/1998"), Some(1998));
        assert_eq!(extract_birth_year("1975"), Some(1975));
        assert_eq!(extract_birth_year("  nato nel 2001  "), Some(2001));
    }

    #[test]
    fn test_extract_birth_year_rejects() {
        assert_eq!(extract_birth_year("05/1872"), None);
        assert_eq!(extract_birth_year("n/a"), None);
        assert_eq!(extract_birth_year(""), None);
        // Matches the pattern but is past the plausible bound.
        assert_eq!(extract_birth_year("2030-01-01"), None);
        assert_eq!(extract_birth_year("2013"), None);
    }

    #[test]
    fn test_extract_birth_year_bounds() {
        assert_eq!(extract_birth_year("1950"), Some(1950));
        assert_eq!(extract_birth_year("2012"), Some(2012));
        assert_eq!(extract_birth_year("1949"), None);
    }

    #[test]
    fn test_normalize_institution_campus_suffix() {
        assert_eq!(
            normalize_institution_name("Modena e Reggio Emilia, sede di Modena").as_deref(),
            Some("Modena e Reggio Emilia")
        );
        assert_eq!(
            normalize_institution_name("Modena e Reggio Emilia, SEDE DI Reggio").as_deref(),
            Some("Modena e Reggio Emilia")
        );
    }

    #[test]
    fn test_normalize_institution_whitespace_and_quotes() {
        assert_eq!(
            normalize_institution_name("  \"Bari   Aldo\tMoro\"  ").as_deref(),
            Some("Bari Aldo Moro")
        );
        assert_eq!(
            normalize_institution_name("“Politecnico” di Torino").as_deref(),
            Some("Politecnico di Torino")
        );
    }

    #[test]
    fn test_normalize_institution_compatibility_forms() {
        // Fullwidth letters fold to ASCII under NFKC.
        assert_eq!(
            normalize_institution_name("ＰＡＤＯＶＡ").as_deref(),
            Some("PADOVA")
        );
    }

    #[test]
    fn test_normalize_institution_empty() {
        assert_eq!(normalize_institution_name("  "), None);
        assert_eq!(normalize_institution_name(""), None);
        assert_eq!(normalize_institution_name("\"\""), None);
    }

    #[test]
    fn test_normalize_course_name() {
        assert_eq!(normalize_course_name("  Full Stack ").as_deref(), Some("Full Stack"));
        assert_eq!(normalize_course_name("   "), None);
    }

    #[test]
    fn test_attribute_text() {
        assert_eq!(attribute_text(&json!("x")).as_deref(), Some("x"));
        assert_eq!(attribute_text(&json!(1998)).as_deref(), Some("1998"));
        assert_eq!(attribute_text(&json!(null)), None);
        assert_eq!(attribute_text(&json!(["a"])), None);
    }

    #[test]
    fn test_attribute_text_unset_values() {
        assert_eq!(attribute_text(&json!("")), None);
        assert_eq!(attribute_text(&json!(0)), None);
        assert_eq!(attribute_text(&json!(0.0)), None);
        assert_eq!(attribute_text(&json!(false)), None);
        assert_eq!(attribute_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(attribute_text(&json!(-3)).as_deref(), Some("-3"));
    }
}
