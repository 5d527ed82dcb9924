//! Web framework integration surface.
//!
//! The boundary between HTTP frameworks and the conduit service. It
//! contains no framework-specific code: integrations build a
//! [`RequestAdapter`] (or implement [`ExtractMetadata`] and
//! [`ExtractParams`] on their own request type), call one of the
//! [`ConduitHandlers`], and send back the returned [`ApiResponse`].
//!
//! # Example Flow
//!
//! ```
//! use std::sync::Arc;
//! use conduit_policy::web::{ConduitHandlers, RequestAdapter};
//! use conduit_policy::{ConduitConfig, ConduitService, MemoryStore, Principal};
//! use serde_json::json;
//!
//! let service = ConduitService::new(ConduitConfig::default(), Arc::new(MemoryStore::new())).unwrap();
//! let handlers = ConduitHandlers::new(service);
//!
//! let mut req = RequestAdapter::new("req-1".to_string());
//! req.set_principal(Some(Principal { id: 1, email: "a@example.com".to_string() }));
//! req.set_body(json!({ "conduit": {
//!     "suriApiKey": "key",
//!     "suriType": "airtable",
//!     "suriObjectKey": "https://api.airtable.com/v0/appXYZ",
//!     "status": "active"
//! }}));
//!
//! let res = handlers.create(&req);
//! assert_eq!(res.status, 201);
//! ```

mod adapter;
mod extract;
pub mod handlers;
mod middleware;
mod response;

pub use adapter::RequestAdapter;
pub use extract::{ExtractMetadata, ExtractParams};
pub use handlers::ConduitHandlers;
pub use middleware::{conduit_id, extract_caller, payload, ID_PARAM};
pub use response::ApiResponse;
