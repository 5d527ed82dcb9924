use std::sync::Arc;

use conduit_policy::{
    Caller, ConduitConfig, ConduitService, ConduitStore, DeleteOutcome, Error, ListParams, MemoryStore, Secret,
    Status, StoreError,
};
use serde_json::{json, Map, Value};

fn obj(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

fn email_conduit(status: &str) -> Map<String, Value> {
    obj(json!({
        "suriApiKey": "sk-secret123",
        "suriType": "email",
        "suriObjectKey": "forms@example.com",
        "status": status
    }))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn service() -> ConduitService {
    init_tracing();
    ConduitService::new(ConduitConfig::default(), Arc::new(MemoryStore::new())).unwrap()
}

#[test]
fn secret_is_fully_redacted() {
    let api_key = Secret::new("sk-secret123".to_string());

    let debug_out = format!("{:?}", api_key);
    assert_eq!(debug_out, "[REDACTED]");
    assert!(!debug_out.contains("String"));
    assert_eq!(format!("{}", api_key), "[REDACTED]");
}

#[test]
fn conduit_debug_hides_api_key_but_json_shows_it() {
    let svc = service();
    let caller = Caller::new("req-1", 1);
    let conduit = svc.create(&caller, &email_conduit("inactive")).unwrap();

    let debug_out = format!("{:?}", conduit);
    assert!(!debug_out.contains("sk-secret123"));
    assert!(debug_out.contains("[REDACTED]"));

    let json = serde_json::to_value(&conduit).unwrap();
    assert_eq!(json["suriApiKey"], "sk-secret123");
}

#[test]
fn status_defaults_to_inactive_at_the_model_layer() {
    let svc = service();
    let caller = Caller::new("req-1", 1);

    let err = svc
        .create(&caller, &obj(json!({
            "suriApiKey": "k",
            "suriType": "email",
            "suriObjectKey": "forms@example.com"
        })))
        .unwrap_err();
    match err {
        Error::Validation(v) => {
            assert_eq!(v.len(), 1);
            assert!(v.touches("status"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let conduit = svc.create(&caller, &email_conduit("inactive")).unwrap();
    assert_eq!(conduit.status, Status::Inactive);
}

#[test]
fn service_built_from_toml() {
    let config = ConduitConfig::from_toml_str(
        r#"
        gateway_user_id = 7

        [curi]
        prefix = "gw"
        domain = "example.link"

        [[targets]]
        kind = "email"
        object_key = { format = "email" }
        "#,
    )
    .unwrap();
    let svc = ConduitService::new(config, Arc::new(MemoryStore::new())).unwrap();
    let caller = Caller::new("req-1", 1);

    let conduit = svc.create(&caller, &email_conduit("active")).unwrap();
    assert!(conduit.curi.starts_with("gw-"));
    assert!(conduit.curi.ends_with(".example.link"));

    let mut airtable = email_conduit("active");
    airtable.insert("suriType".into(), json!("airtable"));
    assert!(matches!(svc.create(&caller, &airtable), Err(Error::Validation(_))));

    let listed = svc.list(&Caller::new("req-2", 7), &ListParams::default()).unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = ConduitConfig::default();
    config.targets.clear();
    assert!(ConduitService::new(config, Arc::new(MemoryStore::new())).is_err());
}

#[test]
fn owner_cascade_removes_everything() {
    let store = Arc::new(MemoryStore::new());
    let svc = ConduitService::new(ConduitConfig::default(), store.clone()).unwrap();
    let alice = Caller::new("req-a", 1);
    let bob = Caller::new("req-b", 2);

    let a1 = svc.create(&alice, &email_conduit("active")).unwrap();
    svc.create(&alice, &email_conduit("inactive")).unwrap();
    svc.create(&bob, &email_conduit("active")).unwrap();

    assert_eq!(svc.remove_owner(1).unwrap(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(svc.delete(&alice, a1.id).unwrap(), DeleteOutcome::AlreadyGone);
    assert_eq!(svc.list(&bob, &ListParams::default()).unwrap().len(), 1);
}

/// A store that is down.
struct UnavailableStore;

impl ConduitStore for UnavailableStore {
    fn insert(&self, _: conduit_policy::NewConduit) -> Result<conduit_policy::Conduit, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn find(&self, _: i64, _: i64) -> Result<Option<conduit_policy::Conduit>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn was_deleted(&self, _: i64, _: i64) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn list(&self, _: &conduit_policy::ListQuery) -> Result<Vec<conduit_policy::Conduit>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn update(&self, _: conduit_policy::Conduit) -> Result<Option<conduit_policy::Conduit>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn delete(&self, _: i64, _: i64) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn delete_owned_by(&self, _: i64) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[test]
fn storage_failures_surface_as_500() {
    let svc = ConduitService::new(ConduitConfig::default(), Arc::new(UnavailableStore)).unwrap();
    let caller = Caller::new("req-1", 1);

    let err = svc.create(&caller, &email_conduit("active")).unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(matches!(err, Error::Storage(StoreError::Unavailable(_))));

    assert_eq!(svc.get(&caller, 1).unwrap_err().status_code(), 500);
    assert_eq!(svc.delete(&caller, 1).unwrap_err().status_code(), 500);
    assert_eq!(svc.remove_owner(1).unwrap_err().status_code(), 500);
}

#[test]
fn validation_runs_before_storage() {
    let svc = ConduitService::new(ConduitConfig::default(), Arc::new(UnavailableStore)).unwrap();
    let caller = Caller::new("req-1", 1);

    let err = svc.create(&caller, &obj(json!({}))).unwrap_err();
    assert_eq!(err.status_code(), 422);
}
