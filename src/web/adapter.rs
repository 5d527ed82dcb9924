//! Request adapter for mapping HTTP requests to conduit operations.

use std::collections::HashMap;

use serde_json::Value;

use crate::request::{Principal, RequestMeta};

use super::{ExtractMetadata, ExtractParams};

/// Framework-agnostic view of an HTTP request.
///
/// Holds simple owned data so it is not tied to any framework's request
/// types. Integrations fill it from their own request (typically via a
/// `From` impl) and hand it to the [`handlers`](super::handlers).
///
/// # Examples
///
/// ```
/// use conduit_policy::web::{ExtractMetadata, ExtractParams, RequestAdapter};
/// use conduit_policy::Principal;
/// use serde_json::json;
///
/// let mut adapter = RequestAdapter::new("req-12345".to_string());
/// adapter.set_principal(Some(Principal {
///     id: 1,
///     email: "alice@example.com".to_string(),
/// }));
/// adapter.add_path_param("id".to_string(), "7".to_string());
/// adapter.set_body(json!({ "conduit": { "status": "active" } }));
///
/// let meta = adapter.extract_metadata();
/// assert_eq!(meta.request_id, "req-12345");
/// assert_eq!(adapter.path_param("id"), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    /// Unique request identifier (required)
    request_id: String,
    /// Principal resolved by auth middleware (optional)
    principal: Option<Principal>,
    /// Query parameters from URL
    query_params: HashMap<String, String>,
    /// Path parameters from routing
    path_params: HashMap<String, String>,
    /// Parsed JSON body
    body: Option<Value>,
}

impl RequestAdapter {
    /// Creates a new request adapter with the given request ID.
    ///
    /// All other fields start empty.
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            principal: None,
            query_params: HashMap::new(),
            path_params: HashMap::new(),
            body: None,
        }
    }

    /// Sets the authenticated principal for this request.
    pub fn set_principal(&mut self, principal: Option<Principal>) {
        self.principal = principal;
    }

    /// Adds a query parameter to the adapter.
    pub fn add_query_param(&mut self, key: String, value: String) {
        self.query_params.insert(key, value);
    }

    /// Adds a path parameter to the adapter.
    pub fn add_path_param(&mut self, key: String, value: String) {
        self.path_params.insert(key, value);
    }

    /// Sets the parsed JSON body.
    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Returns a reference to the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns a reference to the principal, if present.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id.clone(),
            principal: self.principal.clone(),
        }
    }
}

impl ExtractParams for RequestAdapter {
    fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}
