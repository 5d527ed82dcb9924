//! HTTP responses and the error-to-status mapping.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Violations};

/// A status code and JSON body, ready for any framework to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl ApiResponse {
    /// Builds a response from raw parts.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `{ "<key>": <value> }` with the given status.
    ///
    /// A value that fails to serialize becomes a 500.
    pub fn wrapped<T: Serialize + ?Sized>(status: u16, key: &str, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                let mut body = Map::new();
                body.insert(key.to_string(), v);
                Self::new(status, Value::Object(body))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::new(500, errors_object("conduit", &e.to_string()))
            }
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn errors_object(key: &str, message: &str) -> Value {
    json!({ "errors": { key: message } })
}

fn errors_list(violations: &Violations) -> Value {
    let entries: Vec<Value> = violations
        .iter()
        .map(|v| json!({ v.path(): v.message() }))
        .collect();
    json!({ "errors": entries })
}

impl From<Error> for ApiResponse {
    fn from(err: Error) -> Self {
        let status = err.status_code();
        let body = match &err {
            Error::Validation(violations) => errors_list(violations),
            Error::MissingPayload => errors_object("conduit", "is required"),
            Error::Immutable { .. } => errors_object("conduit", "is immutable"),
            Error::DeleteWhileActive => errors_object("conduit", "cannot delete when active"),
            Error::NotFound => errors_object("conduit", "not found"),
            Error::Unauthenticated => errors_object("authorization", "token not found or malformed"),
            Error::CuriCollision { .. } => errors_object("conduit", &err.to_string()),
            Error::Storage(e) => errors_object("storage", &e.to_string()),
        };
        Self::new(status, body)
    }
}
