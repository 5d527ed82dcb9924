//! Conduit operations.
//!
//! [`ConduitService`] ties the pieces together for each verb: the
//! immutable-field check, schema validation, address generation on create,
//! the deletion guard, and the store. It is `Send + Sync` and cheap to
//! clone.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::{ConduitConfig, ConfigError};
use crate::curi::{self, AddressGenerator, CuriGenerator};
use crate::error::Error;
use crate::lifecycle::{self, DeleteOutcome};
use crate::logging::RequestLog;
use crate::model::{Conduit, ConduitId, NewConduit, UserId};
use crate::query::{ListParams, ListQueryResolver};
use crate::request::Caller;
use crate::schema::{ConduitSchema, StoredTarget, WriteMethod};
use crate::store::ConduitStore;
use crate::validator;

/// Conduit CRUD over a shared [`ConduitStore`].
#[derive(Clone)]
pub struct ConduitService {
    store: Arc<dyn ConduitStore>,
    config: Arc<ConduitConfig>,
    generator: Arc<dyn AddressGenerator>,
}

impl std::fmt::Debug for ConduitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConduitService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConduitService {
    /// Creates a service with a random [`CuriGenerator`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(config: ConduitConfig, store: Arc<dyn ConduitStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = CuriGenerator::new(&config.curi)?;
        Ok(Self {
            store,
            config: Arc::new(config),
            generator: Arc::new(generator),
        })
    }

    /// Replaces the address generator.
    pub fn with_generator(mut self, generator: Arc<dyn AddressGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &ConduitConfig {
        &self.config
    }

    fn schema(&self, method: WriteMethod) -> ConduitSchema<'_> {
        ConduitSchema::for_method(method, &self.config)
    }

    /// Validates `payload` and stores a new conduit owned by the caller.
    ///
    /// # Errors
    ///
    /// [`Error::Immutable`] if `curi` is supplied, [`Error::Validation`]
    /// for schema violations, [`Error::CuriCollision`] if every generated
    /// address was taken.
    pub fn create(&self, caller: &Caller, payload: &Map<String, Value>) -> Result<Conduit, Error> {
        let log = RequestLog::for_caller(caller);
        let result = self.try_create(caller, payload);
        if let Ok(conduit) = &result {
            log.info(format_args!("created conduit {} at {}", conduit.id, conduit.curi));
        }
        observe(log, "create", result)
    }

    fn try_create(&self, caller: &Caller, payload: &Map<String, Value>) -> Result<Conduit, Error> {
        let schema = self.schema(WriteMethod::Create);
        validator::reject_immutable(&schema, payload)?;
        let draft = validator::validate(&schema, payload, None)?.into_inner();
        let template = NewConduit::from_draft(draft, caller.user_id(), String::new())?;

        curi::insert_with_curi(self.generator.as_ref(), &self.config.curi.prefix, |curi| {
            self.store.insert(NewConduit {
                curi,
                ..template.clone()
            })
        })
    }

    /// Fetches one of the caller's conduits.
    pub fn get(&self, caller: &Caller, id: ConduitId) -> Result<Conduit, Error> {
        let log = RequestLog::for_caller(caller);
        observe(log, "get", self.load(caller, id))
    }

    fn load(&self, caller: &Caller, id: ConduitId) -> Result<Conduit, Error> {
        self.store.find(id, caller.user_id())?.ok_or(Error::NotFound)
    }

    /// Lists conduits visible to the caller.
    pub fn list(&self, caller: &Caller, params: &ListParams<'_>) -> Result<Vec<Conduit>, Error> {
        let log = RequestLog::for_caller(caller);
        let query = ListQueryResolver::new(&self.config).resolve(caller.user_id(), params);
        log.debug(format_args!("listing {:?} ordered by {:?}", query.scope, query.order));
        observe(log, "list", self.store.list(&query).map_err(Error::from))
    }

    /// Overwrites every writable field of a conduit.
    ///
    /// Optional fields missing from `payload` revert to their defaults.
    pub fn replace(&self, caller: &Caller, id: ConduitId, payload: &Map<String, Value>) -> Result<Conduit, Error> {
        let log = RequestLog::for_caller(caller);
        let result = self.write(caller, id, payload, WriteMethod::Replace);
        if let Ok(conduit) = &result {
            log.info(format_args!("replaced conduit {}", conduit.id));
        }
        observe(log, "replace", result)
    }

    /// Updates only the fields present in `payload`.
    ///
    /// A payload that omits `suriType` has its object key checked against
    /// the stored type.
    pub fn modify(&self, caller: &Caller, id: ConduitId, payload: &Map<String, Value>) -> Result<Conduit, Error> {
        let log = RequestLog::for_caller(caller);
        let result = self.write(caller, id, payload, WriteMethod::Modify);
        if let Ok(conduit) = &result {
            log.info(format_args!("modified conduit {}", conduit.id));
        }
        observe(log, "modify", result)
    }

    fn write(
        &self,
        caller: &Caller,
        id: ConduitId,
        payload: &Map<String, Value>,
        method: WriteMethod,
    ) -> Result<Conduit, Error> {
        let schema = self.schema(method);
        validator::reject_immutable(&schema, payload)?;

        let mut conduit = self.load(caller, id)?;
        let stored = StoredTarget {
            suri_type: &conduit.suri_type,
            suri_object_key: &conduit.suri_object_key,
        };
        let draft = validator::validate(&schema, payload, Some(stored))?.into_inner();

        let status = lifecycle::transition(conduit.status, draft.status);
        if status != conduit.status {
            RequestLog::for_caller(caller).info(format_args!(
                "conduit {} going from {} to {}",
                conduit.id, conduit.status, status
            ));
        }

        match method {
            WriteMethod::Modify => conduit.apply(draft),
            _ => conduit.replace_with(draft),
        }
        self.store.update(conduit)?.ok_or(Error::NotFound)
    }

    /// Deletes an inactive conduit.
    ///
    /// Deleting an id that was already deleted succeeds with
    /// [`DeleteOutcome::AlreadyGone`].
    ///
    /// # Errors
    ///
    /// [`Error::DeleteWhileActive`] for an active conduit,
    /// [`Error::NotFound`] for an id the caller never owned.
    pub fn delete(&self, caller: &Caller, id: ConduitId) -> Result<DeleteOutcome, Error> {
        let log = RequestLog::for_caller(caller);
        let result = self.try_delete(caller, id);
        match &result {
            Ok(DeleteOutcome::Removed) => log.info(format_args!("deleted conduit {id}")),
            Ok(DeleteOutcome::AlreadyGone) => log.debug(format_args!("conduit {id} was already deleted")),
            Err(_) => {}
        }
        observe(log, "delete", result)
    }

    fn try_delete(&self, caller: &Caller, id: ConduitId) -> Result<DeleteOutcome, Error> {
        let owner = caller.user_id();
        match self.store.find(id, owner)? {
            Some(conduit) => {
                lifecycle::guard_delete(&conduit)?;
                lifecycle::settle_delete(id, self.store.delete(id, owner)?)
            }
            None => lifecycle::resolve_absent(self.store.was_deleted(id, owner)?),
        }
    }

    /// Deletes every conduit owned by a removed user, whatever its status.
    ///
    /// Returns the number of conduits removed.
    pub fn remove_owner(&self, user_id: UserId) -> Result<usize, Error> {
        let removed = self.store.delete_owned_by(user_id).map_err(|e| {
            tracing::error!(user_id, error = %e, "owner cascade failed");
            Error::from(e)
        })?;
        tracing::info!(user_id, removed, "removed conduits of deleted user");
        Ok(removed)
    }
}

/// Logs a failed operation at a level matching its severity.
fn observe<T>(log: RequestLog<'_>, op: &str, result: Result<T, Error>) -> Result<T, Error> {
    if let Err(e) = &result {
        match e {
            Error::CuriCollision { .. } | Error::Storage(_) => log.error(format_args!("{op} failed: {e}")),
            Error::Immutable { .. } | Error::DeleteWhileActive => log.warn(format_args!("{op} denied: {e}")),
            _ => log.debug(format_args!("{op} rejected: {e}")),
        }
    }
    result
}
