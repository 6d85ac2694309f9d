use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::Utc;
use mockall::mock;
use mockall::predicate::eq;
use serde_json::Value;
use tower::ServiceExt;

use bpmn_registry_server::{api, NewProcess, ProcessPatch, RegistryError, RegistryService};
use bpmn_registry_store::{
    InMemoryProcessStore, Process, ProcessChanges, ProcessStore, StoreError, StoreResult,
};

// Mock the process store
mock! {
    pub Store {}

    #[async_trait]
    impl ProcessStore for Store {
        async fn insert(&self, process: &Process) -> StoreResult<()>;
        async fn find_by_id(&self, id: &str) -> StoreResult<Option<Process>>;
        async fn find_all(&self) -> StoreResult<Vec<Process>>;
        async fn update_fields(&self, id: &str, changes: &ProcessChanges) -> StoreResult<bool>;
        async fn delete_by_id(&self, id: &str) -> StoreResult<bool>;
        async fn health_check(&self) -> StoreResult<bool>;
        async fn close(&self);
    }
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockStore")
    }
}

fn backend_down() -> StoreError {
    StoreError::Backend("connection refused: mongo-internal-7:27017".to_string())
}

fn stored_process(id: &str) -> Process {
    let now = Utc::now();
    Process {
        id: id.to_string(),
        name: "Order Flow".to_string(),
        description: None,
        bpmn_xml: Some("<xml>A</xml>".to_string()),
        created_at: now,
        updated_at: now,
    }
}

async fn call(service: RegistryService, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let app = api::build_router(Arc::new(service));
    let mut req = Request::builder().method(method).uri(uri);
    if body.is_some() {
        req = req.header("Content-Type", "application/json");
    }
    let req = req
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_store_faults_become_generic_500() {
    let cases = [
        ("GET", "/api/processes", None, "Failed to fetch processes"),
        ("GET", "/api/processes/abc", None, "Failed to fetch process"),
        ("POST", "/api/processes", Some(r#"{"name": "Order Flow"}"#), "Failed to create process"),
        ("PUT", "/api/processes/abc", Some(r#"{"name": "v2"}"#), "Failed to update process"),
        ("DELETE", "/api/processes/abc", None, "Failed to delete process"),
        ("GET", "/api/processes/abc/export", None, "Failed to export process"),
    ];

    for (method, uri, body, message) in cases {
        let mut store = MockStore::new();
        store.expect_find_all().returning(|| Err(backend_down()));
        store.expect_find_by_id().returning(|_| Err(backend_down()));
        store.expect_insert().returning(|_| Err(backend_down()));
        store.expect_delete_by_id().returning(|_| Err(backend_down()));

        let service = RegistryService::new(Arc::new(store));
        let (status, json) = call(service, method, uri, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
        assert_eq!(json["detail"], message);
        assert!(!json.to_string().contains("mongo-internal-7"), "{} {} leaked detail", method, uri);
    }
}

#[tokio::test]
async fn test_update_fault_during_write_is_500() {
    let mut store = MockStore::new();
    store
        .expect_find_by_id()
        .with(eq("abc"))
        .returning(|id| Ok(Some(stored_process(id))));
    store.expect_update_fields().returning(|_, _| Err(backend_down()));

    let service = RegistryService::new(Arc::new(store));
    let (status, json) = call(service, "PUT", "/api/processes/abc", Some(r#"{"name": "v2"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "Failed to update process");
    assert!(!json.to_string().contains("mongo-internal-7"));
}

#[tokio::test]
async fn test_update_fault_during_write_is_reported_as_fault() {
    let mut store = MockStore::new();
    store
        .expect_find_by_id()
        .with(eq("abc"))
        .returning(|id| Ok(Some(stored_process(id))));
    store.expect_update_fields().returning(|_, _| Err(backend_down()));

    let service = RegistryService::new(Arc::new(store));
    let err = service.update("abc", ProcessPatch::default().name("v2")).await.unwrap_err();

    assert!(err.is_fault());
}

#[tokio::test]
async fn test_update_after_concurrent_delete_is_not_found() {
    let mut store = MockStore::new();
    store
        .expect_find_by_id()
        .times(1)
        .returning(|id| Ok(Some(stored_process(id))));
    store
        .expect_update_fields()
        .times(1)
        .returning(|_, _| Ok(false));

    let service = RegistryService::new(Arc::new(store));
    let err = service
        .update("abc", ProcessPatch::default().description(Some("late".to_string())))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::NotFound(id) if id == "abc"));
}

#[tokio::test]
async fn test_update_sends_only_present_fields() {
    let mut store = MockStore::new();
    let existing = stored_process("abc");
    let prior_updated_at = existing.updated_at;
    let reread = Process {
        name: "Order Flow v2".to_string(),
        ..existing.clone()
    };

    // First read is the existence check, second is the re-read after the write.
    let mut reads = vec![Some(reread), Some(existing)];
    store
        .expect_find_by_id()
        .with(eq("abc"))
        .times(2)
        .returning(move |_| Ok(reads.pop().flatten()));
    store
        .expect_update_fields()
        .withf(move |id, changes| {
            id == "abc"
                && changes.name.as_deref() == Some("Order Flow v2")
                && changes.description.is_none()
                && changes.bpmn_xml.is_none()
                && changes.updated_at >= prior_updated_at
        })
        .times(1)
        .returning(|_, _| Ok(true));

    let service = RegistryService::new(Arc::new(store));
    let updated = service
        .update("abc", ProcessPatch::default().name("Order Flow v2"))
        .await
        .unwrap();

    assert_eq!(updated.name, "Order Flow v2");
}

#[tokio::test]
async fn test_health_reports_down_store() {
    let mut store = MockStore::new();
    store.expect_health_check().returning(|| Err(backend_down()));

    let service = RegistryService::new(Arc::new(store));
    let (status, json) = call(service, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "DOWN");
}

#[tokio::test]
async fn test_export_kinds_are_distinct() {
    let service = RegistryService::new(Arc::new(InMemoryProcessStore::new()));

    let missing = service.export("nope").await.unwrap_err();
    assert!(matches!(missing, RegistryError::NotFound(_)));

    let bare = service.create(NewProcess::new("Bare")).await.unwrap();
    let no_content = service.export(&bare.id).await.unwrap_err();
    assert!(matches!(no_content, RegistryError::NoContent(_)));

    let empty = service
        .create(NewProcess::new("Empty").with_bpmn_xml(""))
        .await
        .unwrap();
    assert!(matches!(service.export(&empty.id).await, Err(RegistryError::NoContent(_))));

    let full = service
        .create(NewProcess::new("Order Flow").with_description("d").with_bpmn_xml("<xml>A</xml>"))
        .await
        .unwrap();
    let export = service.export(&full.id).await.unwrap();
    assert_eq!(export.filename, "Order Flow.bpmn");
    assert_eq!(export.content, "<xml>A</xml>");
}

#[tokio::test]
async fn test_concurrent_updates_last_writer_wins_per_field() {
    let service = RegistryService::new(Arc::new(InMemoryProcessStore::new()));
    let created = service
        .create(NewProcess::new("Order Flow").with_bpmn_xml("<xml>A</xml>"))
        .await
        .unwrap();

    let renamer = {
        let service = service.clone();
        let id = created.id.clone();
        tokio::spawn(async move { service.update(&id, ProcessPatch::default().name("Renamed")).await })
    };
    let documenter = {
        let service = service.clone();
        let id = created.id.clone();
        tokio::spawn(async move {
            service
                .update(&id, ProcessPatch::default().description(Some("Documented".to_string())))
                .await
        })
    };

    renamer.await.unwrap().unwrap();
    documenter.await.unwrap().unwrap();

    let merged = service.get(&created.id).await.unwrap();
    assert_eq!(merged.name, "Renamed");
    assert_eq!(merged.description.as_deref(), Some("Documented"));
    assert_eq!(merged.bpmn_xml.as_deref(), Some("<xml>A</xml>"));
    assert_eq!(merged.created_at, created.created_at);
    assert!(merged.updated_at >= created.updated_at);
}
