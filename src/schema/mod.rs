//! Declarative field schemas for conduit write payloads.
//!
//! One [`ConduitSchema`] exists per write verb. It differs only in which
//! fields are required; every field rule is shared. Rules are strict (no
//! coercion) and nested entries are closed shapes.

mod field;
mod shape;
mod target;

pub use target::StoredTarget;

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::config::ConduitConfig;
use crate::error::Violations;
use crate::model::fields::{
    ALLOWLIST, DESCRIPTION, HIDDEN_FORM_FIELD, RACM, STATUS, SURI_API_KEY, SURI_OBJECT_KEY, SURI_TYPE,
    THROTTLE,
};
use crate::model::{ConduitDraft, Status};
use crate::secret::Secret;

/// Path reported for payload-level violations.
pub const PAYLOAD_PATH: &str = "conduit";

/// Top-level keys a write payload may carry.
pub const WRITABLE_FIELDS: [&str; 9] = [
    SURI_API_KEY,
    SURI_TYPE,
    SURI_OBJECT_KEY,
    ALLOWLIST,
    RACM,
    THROTTLE,
    STATUS,
    DESCRIPTION,
    HIDDEN_FORM_FIELD,
];

/// Fields required on create and replace, with their messages.
const REQUIRED_ON_WRITE: [(&str, &str); 4] = [
    (SURI_TYPE, "resource type is required"),
    (SURI_OBJECT_KEY, "object key is required"),
    (SURI_API_KEY, "api key is required"),
    (STATUS, "status is required"),
];

const PAYLOAD_SHAPE: shape::ClosedShape = shape::ClosedShape::new(&WRITABLE_FIELDS);

/// The write verb a payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    /// `POST`: required fields mandatory, optional fields defaulted
    Create,
    /// `PUT`: same required set as create, optional fields revert to defaults
    Replace,
    /// `PATCH`: nothing required, only supplied fields are checked
    Modify,
}

impl WriteMethod {
    /// Fields whose presence in the payload is rejected as immutable,
    /// checked before any field rule runs.
    pub fn immutable_fields(self) -> &'static [&'static str] {
        use crate::model::fields::{CURI, ID, USER_ID};
        match self {
            WriteMethod::Create | WriteMethod::Replace => &[CURI],
            WriteMethod::Modify => &[CURI, ID, USER_ID],
        }
    }

    /// Whether absent optional fields are filled with defaults.
    pub fn injects_defaults(self) -> bool {
        !matches!(self, WriteMethod::Modify)
    }

    fn enforces_required(self) -> bool {
        !matches!(self, WriteMethod::Modify)
    }
}

/// Field schema for one write verb.
#[derive(Debug, Clone, Copy)]
pub struct ConduitSchema<'c> {
    method: WriteMethod,
    config: &'c ConduitConfig,
}

impl<'c> ConduitSchema<'c> {
    /// Schema for `method`, with target kinds drawn from `config`.
    pub fn for_method(method: WriteMethod, config: &'c ConduitConfig) -> Self {
        Self { method, config }
    }

    /// The write verb this schema validates.
    pub fn method(&self) -> WriteMethod {
        self.method
    }

    /// Runs every rule over `payload` and returns the parsed fields together
    /// with every violation found. Never stops at the first violation.
    ///
    /// `stored` supplies the sibling `suriType` for object key checks when a
    /// modify payload omits it.
    pub fn check(&self, payload: &Map<String, Value>, stored: Option<StoredTarget<'_>>) -> (ConduitDraft, Violations) {
        let mut out = Violations::new();
        let filtered = self.without_blank_required(payload);
        let payload: &Map<String, Value> = &filtered;

        let unknown = PAYLOAD_SHAPE.unknown_keys(payload);
        if !unknown.is_empty() {
            out.push(PAYLOAD_PATH, shape::unspecified_keys_message(PAYLOAD_PATH, &unknown));
        }

        if self.method.enforces_required() {
            for (name, message) in REQUIRED_ON_WRITE {
                if !payload.contains_key(name) {
                    out.push(name, message);
                }
            }
        }

        let draft = ConduitDraft {
            suri_api_key: payload
                .get(SURI_API_KEY)
                .and_then(|v| field::expect_str(v, SURI_API_KEY, SURI_API_KEY, &mut out))
                .map(|s| Secret::new(s.to_string())),
            suri_type: payload
                .get(SURI_TYPE)
                .and_then(|v| target::check_kind(v, self.config, &mut out)),
            suri_object_key: target::check_object_key(payload, stored, self.config, &mut out),
            allowlist: payload
                .get(ALLOWLIST)
                .and_then(|v| shape::allowlist(v, ALLOWLIST, &mut out)),
            racm: payload.get(RACM).and_then(|v| shape::methods(v, RACM, &mut out)),
            throttle: payload
                .get(THROTTLE)
                .and_then(|v| field::expect_bool(v, THROTTLE, THROTTLE, &mut out)),
            status: payload
                .get(STATUS)
                .and_then(|v| field::expect_one_of(v, STATUS, STATUS, &Status::ALL, &mut out))
                .and_then(Status::parse),
            description: payload
                .get(DESCRIPTION)
                .and_then(|v| field::expect_str(v, DESCRIPTION, DESCRIPTION, &mut out))
                .map(str::to_string),
            hidden_form_field: payload
                .get(HIDDEN_FORM_FIELD)
                .and_then(|v| shape::hidden_form_fields(v, HIDDEN_FORM_FIELD, &mut out)),
        };

        (draft, out)
    }

    /// Drops required fields given as `""` so they are reported as missing.
    fn without_blank_required<'p>(&self, payload: &'p Map<String, Value>) -> Cow<'p, Map<String, Value>> {
        let is_blank = |name: &str| matches!(payload.get(name), Some(Value::String(s)) if s.is_empty());
        if !self.method.enforces_required() || !REQUIRED_ON_WRITE.iter().any(|&(name, _)| is_blank(name)) {
            return Cow::Borrowed(payload);
        }
        let mut trimmed = payload.clone();
        for (name, _) in REQUIRED_ON_WRITE {
            if is_blank(name) {
                trimmed.remove(name);
            }
        }
        Cow::Owned(trimmed)
    }
}
