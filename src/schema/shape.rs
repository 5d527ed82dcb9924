//! Closed-shape objects and the sequences built from them.
//!
//! An entry of `allowlist` or `hiddenFormField` may carry only its declared
//! keys. The known-keys check runs before any per-key rule; an entry that
//! fails it yields exactly one violation naming the extra keys and its
//! per-key rules are skipped.

use std::net::IpAddr;

use serde_json::{Map, Value};

use super::field::{expect_bool, expect_one_of, expect_str, optional_str, type_message};
use crate::error::Violations;
use crate::model::{AllowListEntry, HffPolicy, HiddenFormField, HttpMethod, Status};

/// An object schema that rejects undeclared keys.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClosedShape {
    keys: &'static [&'static str],
}

pub(crate) const ALLOW_LIST_ENTRY: ClosedShape = ClosedShape::new(&["ip", "status", "comment"]);

pub(crate) const HIDDEN_FORM_FIELD_ENTRY: ClosedShape =
    ClosedShape::new(&["fieldName", "include", "policy", "value"]);

impl ClosedShape {
    pub(crate) const fn new(keys: &'static [&'static str]) -> Self {
        Self { keys }
    }

    /// Keys of `obj` outside the declared set, in map order.
    pub(crate) fn unknown_keys<'m>(&self, obj: &'m Map<String, Value>) -> Vec<&'m str> {
        obj.keys()
            .map(String::as_str)
            .filter(|k| !self.keys.contains(k))
            .collect()
    }

    /// Returns the object if `value` is an object with only declared keys.
    pub(crate) fn check<'v>(
        &self,
        value: &'v Value,
        path: &str,
        out: &mut Violations,
    ) -> Option<&'v Map<String, Value>> {
        let Some(obj) = value.as_object() else {
            out.push(path, type_message(path, "object"));
            return None;
        };

        let unknown = self.unknown_keys(obj);
        if !unknown.is_empty() {
            out.push(path, unspecified_keys_message(path, &unknown));
            return None;
        }

        Some(obj)
    }
}

pub(crate) fn unspecified_keys_message(path: &str, unknown: &[&str]) -> String {
    format!("{path} field has unspecified keys: {}", unknown.join(", "))
}

/// Validates a JSON array entry by entry, continuing past failed entries.
///
/// Returns the parsed sequence only when every entry passed.
pub(crate) fn sequence<'v, T>(
    value: &'v Value,
    field: &str,
    out: &mut Violations,
    mut entry: impl FnMut(&'v Value, &str, &mut Violations) -> Option<T>,
) -> Option<Vec<T>> {
    let Some(items) = value.as_array() else {
        out.push(field, type_message(field, "array"));
        return None;
    };

    let mut parsed = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{field}[{i}]");
        if let Some(t) = entry(item, &path, out) {
            parsed.push(t);
        }
    }

    (parsed.len() == items.len()).then_some(parsed)
}

/// `racm`: a sequence of supported HTTP methods.
pub(crate) fn methods(value: &Value, field: &str, out: &mut Violations) -> Option<Vec<HttpMethod>> {
    sequence(value, field, out, |item, path, out| {
        expect_one_of(item, path, path, &HttpMethod::ALL, out).and_then(HttpMethod::parse)
    })
}

/// `allowlist`: a sequence of `{ip, status, comment?}`.
pub(crate) fn allowlist(value: &Value, field: &str, out: &mut Violations) -> Option<Vec<AllowListEntry>> {
    sequence(value, field, out, allow_list_entry)
}

fn allow_list_entry(value: &Value, path: &str, out: &mut Violations) -> Option<AllowListEntry> {
    let obj = ALLOW_LIST_ENTRY.check(value, path, out)?;

    let ip_path = format!("{path}.ip");
    let ip = match obj.get("ip") {
        None | Some(Value::Null) => {
            out.push(&ip_path, "ip address is required");
            None
        }
        Some(v) => expect_str(v, &ip_path, "ip", out).and_then(|s| match s.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                out.push(&ip_path, "invalid ip address");
                None
            }
        }),
    };

    let status_path = format!("{path}.status");
    let status = match obj.get("status") {
        None | Some(Value::Null) => {
            out.push(&status_path, "status is required");
            None
        }
        Some(v) => expect_one_of(v, &status_path, "status", &Status::ALL, out).and_then(Status::parse),
    };

    let comment = optional_str(obj.get("comment"), &format!("{path}.comment"), "comment", out);

    Some(AllowListEntry {
        ip: ip?,
        status: status?,
        comment: comment?,
    })
}

/// `hiddenFormField`: a sequence of `{fieldName, include, policy, value?}`.
pub(crate) fn hidden_form_fields(
    value: &Value,
    field: &str,
    out: &mut Violations,
) -> Option<Vec<HiddenFormField>> {
    sequence(value, field, out, hidden_form_field_entry)
}

fn hidden_form_field_entry(value: &Value, path: &str, out: &mut Violations) -> Option<HiddenFormField> {
    let obj = HIDDEN_FORM_FIELD_ENTRY.check(value, path, out)?;

    let name_path = format!("{path}.fieldName");
    let field_name = match obj.get("fieldName") {
        None => {
            out.push(&name_path, "fieldName is required");
            None
        }
        Some(v) => expect_str(v, &name_path, "fieldName", out).and_then(|s| {
            if s.trim().is_empty() {
                out.push(&name_path, "invalid fieldName value");
                None
            } else {
                Some(s.to_string())
            }
        }),
    };

    let include_path = format!("{path}.include");
    let include = match obj.get("include") {
        None | Some(Value::Null) => {
            out.push(&include_path, "invalid include value");
            None
        }
        Some(v) => expect_bool(v, &include_path, "include", out),
    };

    let policy_path = format!("{path}.policy");
    let policy = match obj.get("policy") {
        None | Some(Value::Null) => {
            out.push(&policy_path, "invalid policy value");
            None
        }
        Some(v) => expect_one_of(v, &policy_path, "policy", &HffPolicy::ALL, out)
            .and_then(HffPolicy::parse),
    };

    let hff_value = optional_str(obj.get("value"), &format!("{path}.value"), "value", out);

    Some(HiddenFormField {
        field_name: field_name?,
        include: include?,
        policy: policy?,
        value: hff_value?,
    })
}
