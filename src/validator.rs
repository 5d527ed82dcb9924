//! Request validation for conduit writes.
//!
//! Validation runs in two stages:
//!
//! 1. [`reject_immutable`] refuses payloads that try to set the generated
//!    address (or, on modify, identity fields). This is reported as
//!    [`Error::Immutable`], never as a field violation.
//! 2. [`validate`] applies the verb's [`ConduitSchema`], collecting every
//!    violation in one pass, and on success returns the normalized fields
//!    wrapped in [`Validated`].
//!
//! Neither stage touches storage.

use serde_json::{Map, Value};

use crate::error::{Error, Violations};
use crate::model::ConduitDraft;
use crate::schema::{ConduitSchema, StoredTarget, PAYLOAD_PATH};

/// A payload that passed its schema.
///
/// There is no public constructor: the only way to obtain one is
/// [`validate`]. The service only writes drafts it unwrapped from a
/// `Validated`.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    inner: T,
}

impl<T> Validated<T> {
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the normalized value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Validated<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

/// Extracts the conduit object from a request body's `conduit` member.
///
/// # Errors
///
/// [`Error::MissingPayload`] if the member is missing or not an object.
pub fn payload_of(body: Option<&Value>) -> Result<&Map<String, Value>, Error> {
    body.and_then(|b| b.get(PAYLOAD_PATH))
        .and_then(Value::as_object)
        .ok_or(Error::MissingPayload)
}

/// Fails with [`Error::Immutable`] if `payload` names a field the verb may
/// never write.
pub fn reject_immutable(schema: &ConduitSchema<'_>, payload: &Map<String, Value>) -> Result<(), Error> {
    match schema
        .method()
        .immutable_fields()
        .iter()
        .find(|f| payload.contains_key(**f))
    {
        Some(field) => Err(Error::Immutable { field: *field }),
        None => Ok(()),
    }
}

/// Validates `payload` against `schema`, returning all violations at once.
///
/// On success the draft has defaults injected for create and replace.
pub fn validate(
    schema: &ConduitSchema<'_>,
    payload: &Map<String, Value>,
    stored: Option<StoredTarget<'_>>,
) -> Result<Validated<ConduitDraft>, Violations> {
    let (draft, violations) = schema.check(payload, stored);
    let draft = if schema.method().injects_defaults() {
        draft.with_defaults()
    } else {
        draft
    };
    violations.into_result(Validated::new_unchecked(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConduitConfig;
    use crate::model::{HttpMethod, Status};
    use crate::schema::WriteMethod;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn valid_create() -> Map<String, Value> {
        obj(json!({
            "suriApiKey": "key-1",
            "suriType": "airtable",
            "suriObjectKey": "https://api.airtable.com/v0/appAbc",
            "status": "active"
        }))
    }

    #[test]
    fn create_injects_defaults() {
        let config = ConduitConfig::default();
        let schema = ConduitSchema::for_method(WriteMethod::Create, &config);

        let draft = validate(&schema, &valid_create(), None).unwrap().into_inner();

        assert_eq!(draft.status, Some(Status::Active));
        assert_eq!(draft.throttle, Some(true));
        assert_eq!(draft.racm, Some(vec![HttpMethod::Get]));
        assert_eq!(draft.allowlist, Some(vec![]));
        assert_eq!(draft.hidden_form_field, Some(vec![]));
        assert_eq!(draft.description.as_deref(), Some(""));
    }

    #[test]
    fn modify_leaves_absent_fields_untouched() {
        let config = ConduitConfig::default();
        let schema = ConduitSchema::for_method(WriteMethod::Modify, &config);

        let draft = validate(&schema, &obj(json!({ "status": "inactive" })), None)
            .unwrap()
            .into_inner();

        assert_eq!(draft.status, Some(Status::Inactive));
        assert!(draft.throttle.is_none());
        assert!(draft.description.is_none());
    }

    #[test]
    fn collects_all_violations() {
        let config = ConduitConfig::default();
        let schema = ConduitSchema::for_method(WriteMethod::Create, &config);
        let payload = obj(json!({
            "suriType": "foo",
            "suriObjectKey": "http://api.foo.com/v0/",
            "racm": ["GET", "FETCH"],
            "throttle": "yes",
            "allowlist": [{ "ip": "1.2.3.4", "status": "active", "unspecified": "catch me" }]
        }));

        let err = validate(&schema, &payload, None).unwrap_err();

        let paths: Vec<_> = err.iter().map(|v| v.path()).collect();
        assert_eq!(
            paths,
            [
                "suriApiKey",
                "status",
                "suriType",
                "suriObjectKey",
                "allowlist[0]",
                "racm[1]",
                "throttle"
            ]
        );
    }

    #[test]
    fn immutable_address_is_rejected_before_validation() {
        let config = ConduitConfig::default();
        let schema = ConduitSchema::for_method(WriteMethod::Replace, &config);
        let payload = obj(json!({ "curi": "td-abc.conduits.link" }));

        let err = reject_immutable(&schema, &payload).unwrap_err();
        assert!(matches!(err, Error::Immutable { field: "curi" }));
    }

    #[test]
    fn modify_treats_identity_fields_as_immutable() {
        let config = ConduitConfig::default();
        let schema = ConduitSchema::for_method(WriteMethod::Modify, &config);

        let err = reject_immutable(&schema, &obj(json!({ "userId": 9 }))).unwrap_err();
        assert!(matches!(err, Error::Immutable { field: "userId" }));

        let replace = ConduitSchema::for_method(WriteMethod::Replace, &config);
        assert!(reject_immutable(&replace, &obj(json!({ "userId": 9 }))).is_ok());
    }

    #[test]
    fn payload_envelope_is_required() {
        let body = json!({ "conduit": { "status": "active" } });
        assert!(payload_of(Some(&body)).is_ok());

        assert!(matches!(payload_of(Some(&json!({}))), Err(Error::MissingPayload)));
        assert!(matches!(payload_of(Some(&json!({ "conduit": [] }))), Err(Error::MissingPayload)));
        assert!(matches!(payload_of(Some(&json!({ "conduit": "x" }))), Err(Error::MissingPayload)));
        assert!(matches!(payload_of(None), Err(Error::MissingPayload)));
    }
}
