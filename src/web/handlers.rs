//! One handler per `/conduits` endpoint.
//!
//! Handlers never fail: every error is turned into an [`ApiResponse`]
//! through its `From<Error>` impl.

use serde_json::json;

use crate::error::Error;
use crate::lifecycle::DeleteOutcome;
use crate::query::ListParams;
use crate::schema::WriteMethod;
use crate::service::ConduitService;

use super::middleware::{conduit_id, extract_caller, payload};
use super::{ApiResponse, ExtractMetadata, ExtractParams};

/// Handlers for the conduit endpoints.
#[derive(Debug, Clone)]
pub struct ConduitHandlers {
    service: ConduitService,
}

fn respond(result: Result<ApiResponse, Error>) -> ApiResponse {
    result.unwrap_or_else(ApiResponse::from)
}

impl ConduitHandlers {
    /// Wraps `service`.
    pub fn new(service: ConduitService) -> Self {
        Self { service }
    }

    /// The wrapped service.
    pub fn service(&self) -> &ConduitService {
        &self.service
    }

    /// `POST /conduits` → 201 `{conduit: {id, curi}}`
    pub fn create<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> ApiResponse {
        respond(self.try_create(request))
    }

    fn try_create<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> Result<ApiResponse, Error> {
        let caller = extract_caller(request)?;
        let conduit = self.service.create(&caller, payload(request)?)?;
        Ok(ApiResponse::new(
            201,
            json!({ "conduit": { "id": conduit.id, "curi": conduit.curi } }),
        ))
    }

    /// `GET /conduits/:id` → 200 `{conduit: {...}}`
    pub fn get<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> ApiResponse {
        respond(self.try_get(request))
    }

    fn try_get<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> Result<ApiResponse, Error> {
        let caller = extract_caller(request)?;
        let conduit = self.service.get(&caller, conduit_id(request)?)?;
        Ok(ApiResponse::wrapped(200, "conduit", &conduit))
    }

    /// `GET /conduits?start&count&sort` → 200 `{conduits: [...]}`
    pub fn list<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> ApiResponse {
        respond(self.try_list(request))
    }

    fn try_list<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> Result<ApiResponse, Error> {
        let caller = extract_caller(request)?;
        let params = ListParams {
            start: request.query_param("start"),
            count: request.query_param("count"),
            sort: request.query_param("sort"),
        };
        let conduits = self.service.list(&caller, &params)?;
        Ok(ApiResponse::wrapped(200, "conduits", &conduits))
    }

    /// `PUT /conduits/:id` → 200 `{conduit: {...}}`
    pub fn replace<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> ApiResponse {
        respond(self.try_write(request, WriteMethod::Replace))
    }

    /// `PATCH /conduits/:id` → 200 `{conduit: {...}}`
    pub fn modify<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> ApiResponse {
        respond(self.try_write(request, WriteMethod::Modify))
    }

    fn try_write<R: ExtractMetadata + ExtractParams>(
        &self,
        request: &R,
        method: WriteMethod,
    ) -> Result<ApiResponse, Error> {
        let caller = extract_caller(request)?;
        let id = conduit_id(request)?;
        let payload = payload(request)?;
        let conduit = match method {
            WriteMethod::Modify => self.service.modify(&caller, id, payload)?,
            _ => self.service.replace(&caller, id, payload)?,
        };
        Ok(ApiResponse::wrapped(200, "conduit", &conduit))
    }

    /// `DELETE /conduits/:id` → 200 `{conduit: {id}}`, also when the
    /// conduit was already deleted.
    pub fn delete<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> ApiResponse {
        respond(self.try_delete(request))
    }

    fn try_delete<R: ExtractMetadata + ExtractParams>(&self, request: &R) -> Result<ApiResponse, Error> {
        let caller = extract_caller(request)?;
        let id = conduit_id(request)?;
        match self.service.delete(&caller, id)? {
            DeleteOutcome::Removed | DeleteOutcome::AlreadyGone => {
                Ok(ApiResponse::new(200, json!({ "conduit": { "id": id } })))
            }
        }
    }
}
