//! `suriType` and the `suriObjectKey` rule that depends on it.

use serde_json::{Map, Value};

use super::field::{expect_one_of, expect_str};
use crate::config::{ConduitConfig, ObjectKeyFormat};
use crate::error::Violations;
use crate::model::fields::{SURI_OBJECT_KEY, SURI_TYPE};

/// Target fields already stored on the conduit being modified.
#[derive(Debug, Clone, Copy)]
pub struct StoredTarget<'a> {
    /// Stored `suriType`
    pub suri_type: &'a str,
    /// Stored `suriObjectKey`
    pub suri_object_key: &'a str,
}

/// Format rule selected for an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyRule<'c> {
    /// Key must extend a configured URL prefix
    Url {
        kind: &'c str,
        prefix: &'c str,
    },
    /// Key must be an email address
    Email,
}

impl<'c> KeyRule<'c> {
    /// Selects the rule for `kind`.
    ///
    /// A missing or unsupported kind selects [`KeyRule::Email`], never an
    /// accept-anything rule.
    pub(crate) fn for_kind(config: &'c ConduitConfig, kind: Option<&str>) -> Self {
        let target = kind.and_then(|k| config.target(k));
        match target.map(|t| (t.kind.as_str(), &t.object_key)) {
            Some((kind, ObjectKeyFormat::UrlPrefix { prefix })) => KeyRule::Url { kind, prefix },
            Some((_, ObjectKeyFormat::Email)) => KeyRule::Email,
            // fallback for unknown kinds
            None => KeyRule::Email,
        }
    }

    /// Returns the violation message if `key` does not fit.
    pub(crate) fn check(&self, key: &str) -> Option<String> {
        match *self {
            KeyRule::Url { kind, prefix } => {
                let fits = key
                    .strip_prefix(prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace));
                (!fits).then(|| format!("invalid {kind} url"))
            }
            KeyRule::Email => (!is_email(key)).then(|| "invalid email address".to_string()),
        }
    }
}

pub(crate) fn check_kind(value: &Value, config: &ConduitConfig, out: &mut Violations) -> Option<String> {
    let kinds = config.target_kinds();
    expect_one_of(value, SURI_TYPE, SURI_TYPE, &kinds, out).map(str::to_string)
}

/// Checks `suriObjectKey` against the rule of its sibling `suriType`.
///
/// The sibling is the payload's `suriType` when the key is present (even
/// when it is not a string), else the stored type. When only `suriType`
/// changes, the stored key must fit the new kind.
pub(crate) fn check_object_key(
    payload: &Map<String, Value>,
    stored: Option<StoredTarget<'_>>,
    config: &ConduitConfig,
    out: &mut Violations,
) -> Option<String> {
    let kind = match payload.get(SURI_TYPE) {
        Some(v) => v.as_str(),
        None => stored.map(|s| s.suri_type),
    };

    match payload.get(SURI_OBJECT_KEY) {
        Some(value) => {
            let key = expect_str(value, SURI_OBJECT_KEY, SURI_OBJECT_KEY, out)?;
            match KeyRule::for_kind(config, kind).check(key) {
                Some(msg) => {
                    out.push(SURI_OBJECT_KEY, msg);
                    None
                }
                None => Some(key.to_string()),
            }
        }
        None => {
            if let (Some(kind), Some(stored)) = (kind, stored) {
                if config.target(kind).is_some() {
                    if let Some(msg) = KeyRule::for_kind(config, Some(kind)).check(stored.suri_object_key) {
                        out.push(SURI_OBJECT_KEY, msg);
                    }
                }
            }
            None
        }
    }
}

/// Structural email check: `local@domain.tld`, no whitespace.
pub(crate) fn is_email(s: &str) -> bool {
    if s.len() > 254 || s.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |l: &&str| {
        !l.is_empty()
            && !l.starts_with('-')
            && !l.ends_with('-')
            && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    labels.iter().all(label_ok) && tld_ok
}
