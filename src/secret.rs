use std::fmt;

use serde::Serializer;

/// A wrapper that keeps a conduit's target-service credential out of logs.
///
/// The `suriApiKey` of a conduit is stored as `Secret<String>`. Its `Debug`
/// and `Display` output is always `[REDACTED]`, so a conduit can be traced
/// with `?conduit` without leaking the key. The only ways to read the value
/// are [`expose_secret`](Self::expose_secret) and the owner-facing JSON
/// representation, which serializes it through [`serialize_exposed`].
///
/// # Examples
///
/// ```
/// use conduit_policy::Secret;
///
/// let api_key = Secret::new("key-1234567890".to_string());
///
/// assert_eq!(format!("{:?}", api_key), "[REDACTED]");
/// assert_eq!(format!("{}", api_key), "[REDACTED]");
/// assert_eq!(api_key.expose_secret(), "key-1234567890");
/// ```
// Do NOT derive Debug or Display: both must stay redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Serializes the wrapped string in clear text.
///
/// Used with `#[serde(serialize_with = ...)]` on the owner-facing conduit
/// representation only.
pub(crate) fn serialize_exposed<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::new("my-password".to_string());
        let debug_output = format!("{:?}", secret);

        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("my-password"));
        assert!(!debug_output.contains("String"));
    }

    #[test]
    fn display_is_redacted() {
        let secret = Secret::new("api-key-12345");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn redacted_inside_containing_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Row {
            id: i64,
            key: Secret<String>,
        }

        let row = Row {
            id: 7,
            key: Secret::new("airtable-key".to_string()),
        };
        let output = format!("{:?}", row);

        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("airtable-key"));
    }

    #[test]
    fn expose_secret_returns_value() {
        let secret = Secret::new("token".to_string());
        assert_eq!(secret.expose_secret(), "token");
    }

    #[test]
    fn serialize_exposed_writes_clear_text() {
        #[derive(serde::Serialize)]
        struct Wire {
            #[serde(serialize_with = "serialize_exposed")]
            key: Secret<String>,
        }

        let json = serde_json::to_string(&Wire {
            key: Secret::new("k-1".to_string()),
        })
        .unwrap();
        assert_eq!(json, r#"{"key":"k-1"}"#);
    }
}
