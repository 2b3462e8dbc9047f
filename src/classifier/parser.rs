//! Tolerant extraction of classifier verdicts
//!
//! The classifier is asked for `{"category":"...","priority":"..."}` but its
//! output is free text: it may wrap the object in prose or code fences, drop
//! a key, or emit something that is not JSON at all. Rather than rejecting
//! the whole response, each field is scanned for independently and falls
//! back to `Unknown` when it cannot be recovered.

use crate::models::{Category, Classification, Priority};
use std::str::FromStr;

/// Extract category and priority from a raw classifier response. Never fails.
pub fn parse_classification(raw: &str) -> Classification {
    Classification {
        category: extract_value(raw, "category")
            .and_then(|v| Category::from_str(v).ok())
            .unwrap_or(Category::Unknown),
        priority: extract_value(raw, "priority")
            .and_then(|v| Priority::from_str(v).ok())
            .unwrap_or(Priority::Unknown),
    }
}

/// Find `"<key>":` (case-sensitive) and return the first quoted string after it.
///
/// Returns `None` when the key is absent, no quoted value follows, the value
/// is unterminated, or the value is blank.
pub fn extract_value<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{}\":", key);
    let after_key = raw.find(&needle)? + needle.len();

    let rest = &raw[after_key..];
    let open = rest.find('"')? + 1;
    let close = rest[open..].find('"')?;

    let value = rest[open..open + close].trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let parsed = parse_classification(r#"{"category":"INFRASTRUCTURE","priority":"MEDIUM"}"#);
        assert_eq!(parsed, Classification::new(Category::Infrastructure, Priority::Medium));
    }

    #[test]
    fn test_whitespace_and_prose_around_object() {
        let raw = r#"Sure! Here is the analysis:
```json
{
  "category": "SAFETY",
  "priority": "HIGH"
}
```"#;
        let parsed = parse_classification(raw);
        assert_eq!(parsed, Classification::new(Category::Safety, Priority::High));
    }

    #[test]
    fn test_missing_category_key() {
        let parsed = parse_classification(r#"{"priority":"HIGH"}"#);
        assert_eq!(parsed.category, Category::Unknown);
        assert_eq!(parsed.priority, Priority::High);
    }

    #[test]
    fn test_missing_priority_key() {
        let parsed = parse_classification(r#"{"category":"SANITATION"}"#);
        assert_eq!(parsed.category, Category::Sanitation);
        assert_eq!(parsed.priority, Priority::Unknown);
    }

    #[test]
    fn test_empty_values() {
        let parsed = parse_classification(r#"{"category":"","priority":"   "}"#);
        assert!(parsed.is_unknown());
    }

    #[test]
    fn test_garbage() {
        assert!(parse_classification("I cannot help with that.").is_unknown());
        assert!(parse_classification("").is_unknown());
        assert!(parse_classification("}{\"\":::\"").is_unknown());
    }

    #[test]
    fn test_unterminated_value() {
        let parsed = parse_classification(r#"{"priority":"LOW","category":"SAFE"#);
        assert_eq!(parsed.category, Category::Unknown);
        assert_eq!(parsed.priority, Priority::Low);
    }

    #[test]
    fn test_key_without_quoted_value() {
        let parsed = parse_classification(r#"{"category": null}"#);
        assert_eq!(parsed.category, Category::Unknown);
    }

    #[test]
    fn test_key_match_is_case_sensitive() {
        let parsed = parse_classification(r#"{"Category":"SAFETY","PRIORITY":"HIGH"}"#);
        assert!(parsed.is_unknown());
    }

    #[test]
    fn test_value_outside_enumeration() {
        let parsed = parse_classification(r#"{"category":"TRAFFIC","priority":"URGENT"}"#);
        assert!(parsed.is_unknown());
    }

    #[test]
    fn test_value_case_insensitive() {
        let parsed = parse_classification(r#"{"category":"other","priority":"Low"}"#);
        assert_eq!(parsed, Classification::new(Category::Other, Priority::Low));
    }

    #[test]
    fn test_explicit_unknown_value() {
        let parsed = parse_classification(r#"{"category":"UNKNOWN","priority":"MEDIUM"}"#);
        assert_eq!(parsed.category, Category::Unknown);
        assert_eq!(parsed.priority, Priority::Medium);
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let parsed = parse_classification("“category”: «SAFETY» \"category\":\"ßafety\" 🚧");
        assert!(parsed.is_unknown());
    }

    #[test]
    fn test_extract_value() {
        assert_eq!(extract_value(r#"{"a":"b"}"#, "a"), Some("b"));
        assert_eq!(extract_value(r#"{"a": "  b "}"#, "a"), Some("b"));
        assert_eq!(extract_value(r#"{"a":1}"#, "a"), None);
        assert_eq!(extract_value(r#"{"b":"a"}"#, "a"), None);
    }
}
