//! Extraction boundary traits for web integration.
//!
//! Framework integrations implement these for their own request types, or
//! build a [`RequestAdapter`](super::RequestAdapter) and use its
//! implementations.

use serde_json::Value;

use crate::request::RequestMeta;

/// Extracts request metadata from a framework-specific request.
///
/// Implementations supply the request id and the principal resolved by
/// the framework's token middleware. They never authorize anything.
///
/// # Examples
///
/// ```
/// use conduit_policy::web::ExtractMetadata;
/// use conduit_policy::{Principal, RequestMeta};
///
/// struct MyFrameworkRequest {
///     request_id: String,
///     user: Option<(i64, String)>,
/// }
///
/// impl ExtractMetadata for MyFrameworkRequest {
///     fn extract_metadata(&self) -> RequestMeta {
///         RequestMeta {
///             request_id: self.request_id.clone(),
///             principal: self.user.as_ref().map(|(id, email)| Principal {
///                 id: *id,
///                 email: email.clone(),
///             }),
///         }
///     }
/// }
/// ```
pub trait ExtractMetadata {
    /// Returns the request id and principal, if any.
    fn extract_metadata(&self) -> RequestMeta;
}

/// Read access to the untrusted parts of a request.
pub trait ExtractParams {
    /// A routing parameter such as `:id`.
    fn path_param(&self, name: &str) -> Option<&str>;

    /// A query string parameter.
    fn query_param(&self, name: &str) -> Option<&str>;

    /// The parsed JSON body, if one was sent.
    fn body(&self) -> Option<&Value>;
}
