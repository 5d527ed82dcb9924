//! Persistence seam for conduits.
//!
//! [`ConduitStore`] is what the service talks to. [`MemoryStore`] is the
//! bundled implementation: rows behind a `parking_lot::Mutex`, with `curi`
//! uniqueness enforced under the lock.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::model::{fields, Conduit, ConduitId, NewConduit, UserId};
use crate::query::{self, ListQuery};

/// Errors reported by a [`ConduitStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique column already holds the value being written.
    #[error("unique constraint violated on {field}")]
    UniqueViolation {
        /// Column name as it appears on the wire
        field: &'static str,
    },
    /// The backing store cannot serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store reported a result that breaks its own invariants.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

/// Conduit persistence.
///
/// Implementations assign ids and timestamps and must reject a second row
/// with the same `curi`. Every read and write except
/// [`list`](Self::list) with a system-wide scope is scoped to an owner.
pub trait ConduitStore: Send + Sync {
    /// Inserts a new row, assigning `id`, `created_at` and `updated_at`.
    ///
    /// # Errors
    ///
    /// [`StoreError::UniqueViolation`] if `curi` is taken.
    fn insert(&self, new: NewConduit) -> Result<Conduit, StoreError>;

    /// Fetches the owner's conduit with `id`.
    fn find(&self, id: ConduitId, owner: UserId) -> Result<Option<Conduit>, StoreError>;

    /// Returns `true` if the owner's conduit `id` existed and was deleted.
    fn was_deleted(&self, id: ConduitId, owner: UserId) -> Result<bool, StoreError>;

    /// Returns every row in `query.scope`, ordered by `query.order`.
    fn list(&self, query: &ListQuery) -> Result<Vec<Conduit>, StoreError>;

    /// Writes the mutable fields of `conduit` back and bumps `updated_at`.
    ///
    /// `curi`, `user_id` and `created_at` are never changed by an update.
    /// Returns `None` if the row no longer exists.
    fn update(&self, conduit: Conduit) -> Result<Option<Conduit>, StoreError>;

    /// Deletes the owner's conduit `id`, returning the number of rows
    /// removed.
    fn delete(&self, id: ConduitId, owner: UserId) -> Result<usize, StoreError>;

    /// Deletes every conduit of `owner`, returning the number removed.
    fn delete_owned_by(&self, owner: UserId) -> Result<usize, StoreError>;
}

#[derive(Debug)]
struct Tables {
    rows: BTreeMap<ConduitId, Conduit>,
    tombstones: HashMap<ConduitId, UserId>,
    next_id: ConduitId,
    last_write: DateTime<Utc>,
}

impl Tables {
    /// Wall-clock time, nudged forward so writes never share a timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = if now > self.last_write {
            now
        } else {
            self.last_write + Duration::microseconds(1)
        };
        self.last_write = at;
        at
    }

    fn curi_taken(&self, curi: &str) -> bool {
        self.rows.values().any(|c| c.curi == curi)
    }
}

/// In-memory [`ConduitStore`].
///
/// Deleted ids are remembered for the life of the store so that a repeated
/// delete can be told apart from an id that never existed. The tombstone
/// table is never pruned; it grows by one entry per deleted conduit.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store; ids start at 1.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                rows: BTreeMap::new(),
                tombstones: HashMap::new(),
                next_id: 1,
                last_write: DateTime::<Utc>::MIN_UTC,
            }),
        }
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.tables.lock().rows.len()
    }

    /// Returns `true` if the store holds no live rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConduitStore for MemoryStore {
    fn insert(&self, new: NewConduit) -> Result<Conduit, StoreError> {
        let mut tables = self.tables.lock();
        if tables.curi_taken(&new.curi) {
            return Err(StoreError::UniqueViolation { field: fields::CURI });
        }

        let id = tables.next_id;
        tables.next_id += 1;
        let now = tables.tick();

        let conduit = Conduit {
            id,
            suri_api_key: new.suri_api_key,
            suri_type: new.suri_type,
            suri_object_key: new.suri_object_key,
            curi: new.curi,
            allowlist: new.allowlist,
            racm: new.racm,
            throttle: new.throttle,
            status: new.status,
            description: new.description,
            hidden_form_field: new.hidden_form_field,
            user_id: new.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.rows.insert(id, conduit.clone());
        Ok(conduit)
    }

    fn find(&self, id: ConduitId, owner: UserId) -> Result<Option<Conduit>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables.rows.get(&id).filter(|c| c.user_id == owner).cloned())
    }

    fn was_deleted(&self, id: ConduitId, owner: UserId) -> Result<bool, StoreError> {
        let tables = self.tables.lock();
        Ok(tables.tombstones.get(&id) == Some(&owner))
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Conduit>, StoreError> {
        let mut rows: Vec<Conduit> = {
            let tables = self.tables.lock();
            tables
                .rows
                .values()
                .filter(|c| query.scope.matches(c))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| query::compare(&query.order, a, b));
        Ok(rows)
    }

    fn update(&self, conduit: Conduit) -> Result<Option<Conduit>, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.tick();
        let Some(row) = tables
            .rows
            .get_mut(&conduit.id)
            .filter(|c| c.user_id == conduit.user_id)
        else {
            return Ok(None);
        };

        row.suri_api_key = conduit.suri_api_key;
        row.suri_type = conduit.suri_type;
        row.suri_object_key = conduit.suri_object_key;
        row.allowlist = conduit.allowlist;
        row.racm = conduit.racm;
        row.throttle = conduit.throttle;
        row.status = conduit.status;
        row.description = conduit.description;
        row.hidden_form_field = conduit.hidden_form_field;
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    fn delete(&self, id: ConduitId, owner: UserId) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.rows.get(&id).is_some_and(|c| c.user_id == owner) {
            return Ok(0);
        }
        tables.rows.remove(&id);
        tables.tombstones.insert(id, owner);
        Ok(1)
    }

    fn delete_owned_by(&self, owner: UserId) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock();
        let ids: Vec<ConduitId> = tables
            .rows
            .values()
            .filter(|c| c.user_id == owner)
            .map(|c| c.id)
            .collect();
        for id in &ids {
            tables.rows.remove(id);
            tables.tombstones.insert(*id, owner);
        }
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, Status};
    use crate::query::{ListScope, SortKey};
    use crate::secret::Secret;

    fn new_conduit(curi: &str, owner: UserId) -> NewConduit {
        NewConduit {
            curi: curi.into(),
            suri_api_key: Secret::new("key".into()),
            suri_type: "email".into(),
            suri_object_key: "ops@example.com".into(),
            allowlist: vec![],
            racm: vec![HttpMethod::Get],
            throttle: true,
            status: Status::Inactive,
            description: String::new(),
            hidden_form_field: vec![],
            user_id: owner,
        }
    }

    #[test]
    fn insert_assigns_ids_and_timestamps() {
        let store = MemoryStore::new();
        let a = store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();
        let b = store.insert(new_conduit("td-b.conduits.link", 1)).unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.created_at, a.updated_at);
        assert!(b.created_at > a.created_at);
    }

    #[test]
    fn duplicate_curi_is_a_unique_violation() {
        let store = MemoryStore::new();
        store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();

        let err = store.insert(new_conduit("td-a.conduits.link", 2)).unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation { field: "curi" });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reads_are_owner_scoped() {
        let store = MemoryStore::new();
        let c = store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();

        assert!(store.find(c.id, 1).unwrap().is_some());
        assert!(store.find(c.id, 2).unwrap().is_none());
        assert_eq!(store.delete(c.id, 2).unwrap(), 0);
    }

    #[test]
    fn update_keeps_identity_fields() {
        let store = MemoryStore::new();
        let stored = store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();

        let mut edit = stored.clone();
        edit.curi = "td-hijack.conduits.link".into();
        edit.created_at = DateTime::<Utc>::MIN_UTC;
        edit.description = "edited".into();

        let updated = store.update(edit).unwrap().unwrap();
        assert_eq!(updated.curi, stored.curi);
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(updated.description, "edited");
        assert!(updated.updated_at > stored.updated_at);
    }

    #[test]
    fn update_of_missing_row_is_none() {
        let store = MemoryStore::new();
        let c = store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();
        store.delete(c.id, 1).unwrap();
        assert!(store.update(c).unwrap().is_none());
    }

    #[test]
    fn delete_leaves_tombstone() {
        let store = MemoryStore::new();
        let c = store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();

        assert_eq!(store.delete(c.id, 1).unwrap(), 1);
        assert_eq!(store.delete(c.id, 1).unwrap(), 0);
        assert!(store.was_deleted(c.id, 1).unwrap());
        assert!(!store.was_deleted(c.id, 2).unwrap());
        assert!(!store.was_deleted(42, 1).unwrap());
    }

    #[test]
    fn owner_cascade() {
        let store = MemoryStore::new();
        store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();
        store.insert(new_conduit("td-b.conduits.link", 1)).unwrap();
        store.insert(new_conduit("td-c.conduits.link", 2)).unwrap();

        assert_eq!(store.delete_owned_by(1).unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.was_deleted(1, 1).unwrap());
    }

    #[test]
    fn list_filters_then_sorts() {
        let store = MemoryStore::new();
        store.insert(new_conduit("td-a.conduits.link", 1)).unwrap();
        store.insert(new_conduit("td-b.conduits.link", 2)).unwrap();
        store.insert(new_conduit("td-c.conduits.link", 1)).unwrap();

        let rows = store
            .list(&ListQuery {
                scope: ListScope::Owner(1),
                order: vec![SortKey::DEFAULT],
            })
            .unwrap();

        assert_eq!(rows.iter().map(|c| c.id).collect::<Vec<_>>(), [3, 1]);
    }
}
