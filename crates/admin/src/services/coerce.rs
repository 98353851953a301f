//! Lenient field coercion for JSON bodies posted by the editor screens.
//!
//! Editor payloads are loosely typed: numbers may arrive as strings, lists
//! may contain blanks, and any field may be missing. These helpers read a
//! field the forgiving way and never fail.

use serde_json::Value;

/// A field as text. Missing and `null` read as empty.
#[must_use]
pub fn text(body: &Value, key: &str) -> String {
    match body.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The first of several field names holding non-null text.
#[must_use]
pub fn text_any(body: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find(|key| !matches!(body.get(**key), None | Some(Value::Null)))
        .map(|key| text(body, key))
        .unwrap_or_default()
}

/// Trimmed text, `None` when blank.
#[must_use]
pub fn optional_text(body: &Value, key: &str) -> Option<String> {
    let value = text(body, key);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Truthiness: `false`, `null`, `0`, `""` and missing are false.
#[must_use]
pub fn truthy(body: &Value, key: &str) -> bool {
    match body.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// True unless the field is exactly `false`.
#[must_use]
pub fn unless_false(body: &Value, key: &str) -> bool {
    !matches!(body.get(key), Some(Value::Bool(false)))
}

/// A field as a number. Missing and `null` read as `0`; unparseable text
/// reads as `NaN`.
#[must_use]
pub fn number(body: &Value, key: &str) -> f64 {
    match body.get(key) {
        None | Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(_) | Value::Object(_)) => f64::NAN,
    }
}

/// A list of non-empty strings. Anything but an array reads as empty.
#[must_use]
pub fn string_list(body: &Value, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = body.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_text_coerces_scalars() {
        let body = json!({ "name": "Growth Oil", "size": 100, "blurb": null });
        assert_eq!(text(&body, "name"), "Growth Oil");
        assert_eq!(text(&body, "size"), "100");
        assert_eq!(text(&body, "blurb"), "");
        assert_eq!(text(&body, "missing"), "");
    }

    #[test]
    fn test_text_any_prefers_first_present_key() {
        let body = json!({ "name": "Lerato", "message": "Soft curls" });
        assert_eq!(text_any(&body, &["author", "name"]), "Lerato");
        assert_eq!(text_any(&body, &["text", "message"]), "Soft curls");
        assert_eq!(text_any(&body, &["nope"]), "");
    }

    #[test]
    fn test_truthy_follows_loose_rules() {
        let body = json!({ "a": true, "b": 0, "c": "", "d": "no", "e": [] , "f": 2 });
        assert!(truthy(&body, "a"));
        assert!(!truthy(&body, "b"));
        assert!(!truthy(&body, "c"));
        assert!(truthy(&body, "d"));
        assert!(truthy(&body, "e"));
        assert!(truthy(&body, "f"));
        assert!(!truthy(&body, "missing"));
    }

    #[test]
    fn test_unless_false_defaults_true() {
        let body = json!({ "published": false, "other": null });
        assert!(!unless_false(&body, "published"));
        assert!(unless_false(&body, "other"));
        assert!(unless_false(&body, "missing"));
    }

    #[test]
    fn test_number_parses_strings() {
        let body = json!({ "a": "4.5", "b": 3, "c": "abc", "d": "" });
        assert!((number(&body, "a") - 4.5).abs() < f64::EPSILON);
        assert!((number(&body, "b") - 3.0).abs() < f64::EPSILON);
        assert!(number(&body, "c").is_nan());
        assert!(number(&body, "d").abs() < f64::EPSILON);
        assert!(number(&body, "missing").abs() < f64::EPSILON);
    }

    #[test]
    fn test_string_list_drops_blanks() {
        let body = json!({ "steps": ["Apply", "", null, 2], "notalist": "x" });
        assert_eq!(string_list(&body, "steps"), vec!["Apply", "2"]);
        assert!(string_list(&body, "notalist").is_empty());
    }
}
