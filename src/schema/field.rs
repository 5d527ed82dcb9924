//! Strict primitive rules. No coercion: `"true"` is not a boolean and `1`
//! is not a string.

use serde_json::Value;

use crate::error::Violations;

/// `"<field> must be a `<ty>` type"`
pub(crate) fn type_message(field: &str, ty: &str) -> String {
    format!("{field} must be a `{ty}` type")
}

/// `"<field> must be one of the following values: a, b"`
pub(crate) fn one_of_message(field: &str, allowed: &[&str]) -> String {
    format!(
        "{field} must be one of the following values: {}",
        allowed.join(", ")
    )
}

/// Accepts a JSON string.
pub(crate) fn expect_str<'v>(
    value: &'v Value,
    path: &str,
    field: &str,
    out: &mut Violations,
) -> Option<&'v str> {
    match value.as_str() {
        Some(s) => Some(s),
        None => {
            out.push(path, type_message(field, "string"));
            None
        }
    }
}

/// Accepts a JSON boolean.
pub(crate) fn expect_bool(value: &Value, path: &str, field: &str, out: &mut Violations) -> Option<bool> {
    match value.as_bool() {
        Some(b) => Some(b),
        None => {
            out.push(path, type_message(field, "boolean"));
            None
        }
    }
}

/// Accepts a JSON string that is exactly one of `allowed`.
pub(crate) fn expect_one_of<'v>(
    value: &'v Value,
    path: &str,
    field: &str,
    allowed: &[&str],
    out: &mut Violations,
) -> Option<&'v str> {
    let s = expect_str(value, path, field, out)?;
    if allowed.contains(&s) {
        Some(s)
    } else {
        out.push(path, one_of_message(field, allowed));
        None
    }
}

/// Accepts an optional string where `null` means "use the default".
pub(crate) fn optional_str(
    value: Option<&Value>,
    path: &str,
    field: &str,
    out: &mut Violations,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(v) => expect_str(v, path, field, out).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_are_not_coerced() {
        let mut out = Violations::new();
        assert_eq!(expect_str(&json!("x"), "p", "p", &mut out), Some("x"));
        assert_eq!(expect_str(&json!(1), "p", "p", &mut out), None);
        assert_eq!(expect_str(&Value::Null, "p", "p", &mut out), None);
        assert_eq!(out.len(), 2);
        assert_eq!(out.iter().next().unwrap().message(), "p must be a `string` type");
    }

    #[test]
    fn booleans_are_not_coerced() {
        let mut out = Violations::new();
        assert_eq!(expect_bool(&json!(false), "t", "t", &mut out), Some(false));
        assert_eq!(expect_bool(&json!("true"), "t", "t", &mut out), None);
        assert_eq!(expect_bool(&json!(1), "t", "t", &mut out), None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let mut out = Violations::new();
        let value = json!("drop");
        let got = expect_one_of(
            &value,
            "hiddenFormField[0].policy",
            "policy",
            &["drop-if-filled", "pass-if-match"],
            &mut out,
        );
        assert!(got.is_none());
        let v = out.iter().next().unwrap();
        assert_eq!(v.path(), "hiddenFormField[0].policy");
        assert_eq!(
            v.message(),
            "policy must be one of the following values: drop-if-filled, pass-if-match"
        );
    }

    #[test]
    fn optional_str_defaults_absent_and_null() {
        let mut out = Violations::new();
        assert_eq!(optional_str(None, "c", "c", &mut out), Some(String::new()));
        assert_eq!(optional_str(Some(&Value::Null), "c", "c", &mut out), Some(String::new()));
        assert_eq!(optional_str(Some(&json!("hi")), "c", "c", &mut out), Some("hi".into()));
        assert_eq!(optional_str(Some(&json!([])), "c", "c", &mut out), None);
        assert_eq!(out.len(), 1);
    }
}
