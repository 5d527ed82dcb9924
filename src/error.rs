use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by conduit operations.
///
/// Each variant maps to exactly one HTTP status in
/// [`ApiResponse`](crate::web::ApiResponse); see [`Error::status_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(Violations),
    /// The request body has no `conduit` object.
    #[error("conduit is required")]
    MissingPayload,
    /// The caller tried to set a field that can never be written.
    #[error("{field} is immutable")]
    Immutable {
        /// Name of the offending field as it appears on the wire
        field: &'static str,
    },
    /// Delete was attempted while the conduit is active.
    #[error("cannot delete when active")]
    DeleteWhileActive,
    /// The conduit does not exist for this caller.
    #[error("conduit not found")]
    NotFound,
    /// No authenticated caller was attached to the request.
    #[error("token not found or malformed")]
    Unauthenticated,
    /// Every address generation attempt hit the uniqueness constraint.
    #[error("generated curi collided on all {attempts} attempts")]
    CuriCollision {
        /// Number of attempts made before giving up
        attempts: usize,
    },
    /// The store failed unexpectedly.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl Error {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::MissingPayload => 422,
            Error::Immutable { .. } | Error::DeleteWhileActive => 403,
            Error::NotFound => 404,
            Error::Unauthenticated => 401,
            Error::CuriCollision { .. } | Error::Storage(_) => 500,
        }
    }
}

impl From<Violations> for Error {
    fn from(v: Violations) -> Self {
        Error::Validation(v)
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    path: String,
    message: String,
}

impl Violation {
    /// Creates a violation for the given field path (e.g. `allowlist[0].ip`).
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The dotted/indexed path of the offending field.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a violation.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation::new(path, message));
    }

    /// Moves all violations from `other` into `self`.
    pub fn append(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the recorded violations.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Returns `true` if some violation sits at `path` or below it.
    pub fn touches(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path.starts_with(path))
    }

    /// Converts into `Ok(value)` when empty, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, Violations> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(Error::Validation(Violations::new()).status_code(), 422);
        assert_eq!(Error::MissingPayload.status_code(), 422);
        assert_eq!(Error::Immutable { field: "curi" }.status_code(), 403);
        assert_eq!(Error::DeleteWhileActive.status_code(), 403);
        assert_eq!(Error::NotFound.status_code(), 404);
        assert_eq!(Error::Unauthenticated.status_code(), 401);
        assert_eq!(Error::CuriCollision { attempts: 2 }.status_code(), 500);
        assert_eq!(
            Error::Storage(StoreError::Unavailable("down".into())).status_code(),
            500
        );
    }

    #[test]
    fn immutable_message() {
        let err = Error::Immutable { field: "curi" };
        assert_eq!(err.to_string(), "curi is immutable");
    }

    #[test]
    fn violations_collect_in_order() {
        let mut v = Violations::new();
        v.push("suriType", "resource type is required");
        v.push("allowlist[0].ip", "invalid ip address");

        assert_eq!(v.len(), 2);
        let paths: Vec<_> = v.iter().map(Violation::path).collect();
        assert_eq!(paths, ["suriType", "allowlist[0].ip"]);
        assert!(v.touches("allowlist"));
        assert!(!v.touches("racm"));
    }

    #[test]
    fn violations_display_joins_entries() {
        let mut v = Violations::new();
        v.push("a", "x");
        v.push("b", "y");
        assert_eq!(v.to_string(), "a: x; b: y");
    }

    #[test]
    fn empty_violations_into_ok() {
        assert_eq!(Violations::new().into_result(7), Ok(7));

        let mut v = Violations::new();
        v.push("status", "status is required");
        assert!(v.into_result(()).is_err());
    }
}
