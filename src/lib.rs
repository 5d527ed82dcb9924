//! Validation and policy layer for conduits.
//!
//! A conduit is a user-owned record that forwards inbound form submissions
//! to a third-party storage target (Airtable, Google Sheets, email). This
//! crate decides which conduit writes are accepted and how stored conduits
//! are listed:
//! - **Field schemas** with strict types, closed nested shapes, and an
//!   object key format that depends on the sibling `suriType`
//! - **Request validation** that collects every violation in one pass
//! - **Lifecycle rules**: an immutable generated address, and deletion only
//!   while inactive
//! - **Identifier generation** with a single retry on collision
//! - **List queries** with pagination, an allow-listed sort grammar, and a
//!   privileged gateway caller
//!
//! # Core Types
//!
//! - [`ConduitService`]: create/read/list/replace/modify/delete over a
//!   [`ConduitStore`]
//! - [`ConduitConfig`]: target kinds, identifier settings, gateway caller
//! - [`Error`]: one variant per HTTP status class, mapped by
//!   [`web::ApiResponse`]
//! - [`Secret<T>`]: wrapper that redacts the target credential in logs
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use conduit_policy::{Caller, ConduitConfig, ConduitService, Error, MemoryStore};
//! use serde_json::json;
//!
//! let service = ConduitService::new(ConduitConfig::default(), Arc::new(MemoryStore::new())).unwrap();
//! let caller = Caller::new("req-123", 1);
//!
//! let payload = json!({
//!     "suriApiKey": "key-123",
//!     "suriType": "email",
//!     "suriObjectKey": "forms@example.com",
//!     "status": "active"
//! });
//! let conduit = service.create(&caller, payload.as_object().unwrap()).unwrap();
//! assert!(conduit.curi.ends_with(".conduits.link"));
//!
//! // Active conduits cannot be deleted
//! assert!(matches!(service.delete(&caller, conduit.id), Err(Error::DeleteWhileActive)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod curi;
mod error;
pub mod lifecycle;
mod logging;
mod model;
pub mod query;
mod request;
pub mod schema;
mod secret;
mod service;
mod store;
pub mod validator;
pub mod web;

pub use config::{ConduitConfig, ConfigError, CuriSettings, ObjectKeyFormat, ServiceTarget};
pub use curi::{AddressGenerator, CuriGenerator, MAX_CURI_ATTEMPTS};
pub use error::{Error, Violation, Violations};
pub use lifecycle::DeleteOutcome;
pub use logging::RequestLog;
pub use model::{
    fields, AllowListEntry, Conduit, ConduitDraft, ConduitId, HffPolicy, HiddenFormField, HttpMethod,
    NewConduit, Status, UserId, CURI_MAX_LEN,
};
pub use query::{ListParams, ListQuery, ListScope, SortDirection, SortField, SortKey};
pub use request::{Caller, Principal, RequestMeta};
pub use secret::Secret;
pub use service::ConduitService;
pub use store::{ConduitStore, MemoryStore, StoreError};
pub use validator::Validated;
