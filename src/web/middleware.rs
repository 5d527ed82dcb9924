//! Per-request extraction run before a handler touches the service.
//!
//! ```text
//! HTTP Request
//!   ↓
//! Framework-specific code builds RequestAdapter
//!   ↓
//! extract_caller()  → 401 if no principal
//!   ↓
//! conduit_id() / payload()
//!   ↓
//! ConduitService
//! ```

use serde_json::{Map, Value};

use crate::error::Error;
use crate::model::ConduitId;
use crate::request::Caller;
use crate::validator;

use super::{ExtractMetadata, ExtractParams};

/// Path parameter holding the conduit id.
pub const ID_PARAM: &str = "id";

/// Resolves the authenticated caller.
///
/// # Errors
///
/// [`Error::Unauthenticated`] if the request carries no principal.
///
/// # Examples
///
/// ```
/// use conduit_policy::web::{extract_caller, RequestAdapter};
///
/// let adapter = RequestAdapter::new("req-no-auth".to_string());
/// assert!(extract_caller(&adapter).is_err());
/// ```
pub fn extract_caller<R: ExtractMetadata>(request: &R) -> Result<Caller, Error> {
    request.extract_metadata().authenticate()
}

/// Parses the `:id` path parameter.
///
/// An id that is missing or not an integer cannot name a conduit, so it
/// is reported as [`Error::NotFound`].
pub fn conduit_id<R: ExtractParams>(request: &R) -> Result<ConduitId, Error> {
    request
        .path_param(ID_PARAM)
        .and_then(|raw| raw.parse().ok())
        .ok_or(Error::NotFound)
}

/// Returns the `conduit` object of the request body.
pub fn payload<R: ExtractParams>(request: &R) -> Result<&Map<String, Value>, Error> {
    validator::payload_of(request.body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Principal;
    use crate::web::RequestAdapter;
    use serde_json::json;

    #[test]
    fn caller_requires_principal() {
        let adapter = RequestAdapter::new("req-no-principal".to_string());
        assert!(matches!(extract_caller(&adapter), Err(Error::Unauthenticated)));
    }

    #[test]
    fn caller_carries_request_id() {
        let mut adapter = RequestAdapter::new("req-auth-test".to_string());
        adapter.set_principal(Some(Principal {
            id: 123,
            email: "test@example.com".to_string(),
        }));

        let caller = extract_caller(&adapter).unwrap();
        assert_eq!(caller.request_id(), "req-auth-test");
        assert_eq!(caller.user_id(), 123);
    }

    #[test]
    fn non_numeric_id_is_not_found() {
        let mut adapter = RequestAdapter::new("req-1".to_string());
        assert!(matches!(conduit_id(&adapter), Err(Error::NotFound)));

        adapter.add_path_param("id".to_string(), "abc".to_string());
        assert!(matches!(conduit_id(&adapter), Err(Error::NotFound)));

        adapter.add_path_param("id".to_string(), "42".to_string());
        assert_eq!(conduit_id(&adapter).unwrap(), 42);
    }

    #[test]
    fn payload_needs_conduit_envelope() {
        let mut adapter = RequestAdapter::new("req-1".to_string());
        assert!(matches!(payload(&adapter), Err(Error::MissingPayload)));

        adapter.set_body(json!({ "conduit": { "status": "active" } }));
        assert_eq!(payload(&adapter).unwrap()["status"], "active");
    }
}
