use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use super::*;
use crate::api::{ApiRequest, ApiResponse, Method, RequestBody};
use crate::error::{ApiError, Outcome};
use crate::models::{DlSide, EntityData, FieldTarget, Inventory, Record, UploadFile};
use crate::testing::FakeBackend;

// ========================
// Fixtures
// ========================

fn inventory_fixture(itemuid: &str, make: &str) -> Value {
    json!({
        "itemuid": itemuid,
        "Make": make,
        "Model": "Focus",
        "Year": 2016,
        "extdata": {"disclosures": format!("{} disclosures", make)},
        "options_info": ["ABS"]
    })
}

fn contact_fixture() -> Value {
    json!({
        "contactuid": "c-1",
        "firstName": "Ada",
        "type": 2,
        "dluidfront": "dl-front",
        "dluidback": "",
        "extdata": {"PROSPECT1_ID": "p-1", "PROSPECT2_ID": "p-2"},
        "prospect": [{"notes": "p-1"}]
    })
}

fn json_body(request: &ApiRequest) -> Value {
    match &request.body {
        RequestBody::Json(body) => body.clone(),
        _ => Value::Null,
    }
}

fn ok(body: Value) -> crate::error::ApiResult<ApiResponse> {
    Ok(ApiResponse::json(200, &body))
}

/// Media endpoints: records are numbered, uploads of `fail_name` are
/// rejected, pairings are listed back as photos
fn install_media(backend: &FakeBackend, inventoryuid: &str, fail_name: &'static str) -> Arc<Mutex<Vec<String>>> {
    let counter = Arc::new(AtomicUsize::new(0));
    backend.on(Method::Post, "media/*/create", move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        ok(json!({"status": "OK", "itemUID": format!("rec-{}", n)}))
    });
    backend.on(Method::Post, "media/*/upload", move |request| {
        let record = request.path.split('/').nth(1).unwrap_or_default().to_string();
        match &request.body {
            RequestBody::File(file) if file.file_name == fail_name => {
                ok(json!({"status": "Error", "error": "unsupported file"}))
            }
            RequestBody::File(_) => ok(json!({"status": "OK", "itemuid": format!("m-{}", record)})),
            _ => ok(json!({"status": "Error", "error": "no file"})),
        }
    });

    let paired = Arc::new(Mutex::new(Vec::<String>::new()));
    let pairs = paired.clone();
    backend.on(Method::Post, &format!("inventory/{}/media", inventoryuid), move |request| {
        let mediauid = json_body(request)["mediaitemuid"].as_str().unwrap_or_default().to_string();
        pairs.lock().unwrap().push(mediauid);
        ok(json!({"status": "OK"}))
    });
    let pairs = paired.clone();
    backend.on(Method::Get, &format!("inventory/{}/medialist", inventoryuid), move |_| {
        let items: Vec<Value> = pairs
            .lock()
            .unwrap()
            .iter()
            .map(|m| json!({"itemuid": format!("pair-{}", m), "mediauid": m, "contenttype": 0}))
            .collect();
        ok(Value::Array(items))
    });
    backend.on(Method::Get, "media/*/media", |_| {
        Ok(ApiResponse::bytes("image/jpeg", vec![0xff, 0xd8, 0xff]))
    });
    backend.on(Method::Post, "media/*/delete", |_| ok(json!({"status": "OK"})));
    paired
}

fn inventory_store() -> (Arc<FakeBackend>, Arc<InventoryStore>) {
    let backend = FakeBackend::new();
    backend.on_json(Method::Get, "inventory/inv-1/info", inventory_fixture("inv-1", "Ford"));
    backend.on_json(Method::Get, "inventory/inv-2/info", inventory_fixture("inv-2", "Honda"));
    let store = Arc::new(InventoryStore::new(backend.client()));
    (backend, store)
}

async fn wait_for_state(store: &InventoryStore, state: StoreState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.state() != state {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

/// Resolves once `path` has been requested, even if it is held
async fn wait_for_request(backend: &FakeBackend, path: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.requests_to(path).is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

// ========================
// Load and clear
// ========================

#[tokio::test]
async fn test_clear_then_load_has_no_residue() {
    let (_backend, store) = inventory_store();
    assert_eq!(store.load("inv-1").await, Outcome::Ok);
    store.mutate_field(FieldTarget::Entity, "Color", "Red");
    store.mutate_field(FieldTarget::Extension, "notes", "dent");
    store.toggle_option("Sunroof");

    store.clear();
    assert_eq!(store.load("inv-2").await, Outcome::Ok);

    let expected = EntityData::split::<Inventory>(Record::from_value(inventory_fixture("inv-2", "Honda")).unwrap());
    assert_eq!(store.entity().data(), Some(expected));
    assert_eq!(store.options(), vec!["ABS"]);
    assert!(!store.is_changed());
    assert_eq!(store.state(), StoreState::Loaded);
}

#[tokio::test]
async fn test_load_error_keeps_previous_data() {
    let (_backend, store) = inventory_store();
    store.load("inv-1").await;

    let outcome = store.load("missing").await;
    assert!(matches!(outcome, Outcome::Error(_)));
    assert_eq!(store.id().as_deref(), Some("inv-1"));
    assert_eq!(store.record().get_str("Make"), Some("Ford"));
    assert!(matches!(store.state(), StoreState::Error(_)));
}

#[tokio::test]
async fn test_load_requires_id() {
    let (backend, store) = inventory_store();
    assert!(matches!(store.load("").await, Outcome::Error(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_overlapping_load_is_busy() {
    let (backend, store) = inventory_store();
    let gate = backend.hold("inventory/inv-1/info");

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.load("inv-1").await }
    });
    wait_for_state(&store, StoreState::Loading).await;

    assert_eq!(store.load("inv-2").await, Outcome::Busy);
    assert_eq!(store.save().await, Outcome::Busy);

    gate.add_permits(1);
    assert_eq!(first.await.unwrap(), Outcome::Ok);
    assert_eq!(store.id().as_deref(), Some("inv-1"));
    assert!(backend.requests_to("inventory/inv-2/info").is_empty());
}

#[tokio::test]
async fn test_clear_cancels_inflight_load() {
    let (backend, store) = inventory_store();
    let _gate = backend.hold("inventory/inv-1/info");

    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.load("inv-1").await }
    });
    wait_for_state(&store, StoreState::Loading).await;

    store.clear();
    assert_eq!(pending.await.unwrap(), Outcome::Cancelled);
    assert_eq!(store.entity().data(), None);
    assert_eq!(store.state(), StoreState::Idle);
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let (_backend, store) = inventory_store();
    store.clear();
    store.clear();
    assert_eq!(store.state(), StoreState::Idle);
    assert!(store.record().is_empty());
}

// ========================
// Field edits
// ========================

#[tokio::test]
async fn test_mutate_field_changes_only_target() {
    let (_backend, store) = inventory_store();
    store.load("inv-1").await;
    let before = store.entity().data().unwrap();

    assert!(store.mutate_field(FieldTarget::Entity, "Make", "Toyota"));

    let after = store.entity().data().unwrap();
    let mut expected = before.record.clone();
    expected.set("Make", "Toyota");
    assert_eq!(after.record, expected);
    assert_eq!(after.extdata, before.extdata);
    assert_eq!(after.side, before.side);
    assert!(store.is_changed());
}

#[tokio::test]
async fn test_mutate_field_ignored_without_entity_or_read_only() {
    let (_backend, store) = inventory_store();
    assert!(!store.mutate_field(FieldTarget::Entity, "Make", "Toyota"));
    assert!(!store.is_changed());

    store.load("inv-1").await;
    assert!(!store.mutate_field(FieldTarget::Entity, "itemuid", "other"));
    assert!(!store.mutate_field(FieldTarget::Entity, "options_info", json!([])));
    assert!(!store.is_changed());

    assert!(store.mutate_field(FieldTarget::Extension, "disclosures", "updated"));
    assert_eq!(store.extdata().get_str("disclosures"), Some("updated"));
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let (_backend, store) = inventory_store();
    let rx = store.subscribe();
    store.load("inv-1").await;
    let loaded = rx.borrow().clone();
    assert_eq!(loaded.state, StoreState::Loaded);
    assert!(!loaded.changed);

    store.mutate_field(FieldTarget::Entity, "Make", "Kia");
    let edited = rx.borrow().clone();
    assert!(edited.changed);
    assert!(edited.revision > loaded.revision);
}

#[tokio::test]
async fn test_toggle_option_is_saved() {
    let (backend, store) = inventory_store();
    backend.on_json(Method::Post, "inventory/inv-1/set", json!({"status": "OK", "itemuid": "inv-1"}));
    store.load("inv-1").await;

    assert!(store.toggle_option("Sunroof"));
    assert!(store.toggle_option("ABS"));
    assert_eq!(store.options(), vec!["Sunroof"]);
    assert!(store.is_changed());

    assert_eq!(store.save().await, Outcome::Ok);
    let body = json_body(&backend.requests_to("inventory/inv-1/set")[0]);
    assert_eq!(body["options_info"], json!(["Sunroof"]));
    assert_eq!(body["extdata"]["disclosures"], json!("Ford disclosures"));
    assert!(!store.is_changed());
}

// ========================
// Save
// ========================

#[tokio::test]
async fn test_save_new_adopts_server_id() {
    let (backend, store) = inventory_store();
    backend.on_json(Method::Post, "inventory/0/set", json!({"status": "OK", "itemuid": "inv-9"}));
    backend.on_json(Method::Post, "inventory/inv-9/set", json!({"status": "OK", "itemuid": "inv-9"}));

    store.begin_new();
    store.mutate_field(FieldTarget::Entity, "VIN", "1HGCM82633A004352");
    assert_eq!(store.save().await, Outcome::Ok);
    assert_eq!(store.id().as_deref(), Some("inv-9"));

    store.mutate_field(FieldTarget::Entity, "Make", "Honda");
    assert_eq!(store.save().await, Outcome::Ok);

    assert_eq!(backend.requests_to("inventory/0/set").len(), 1);
    let update = backend.requests_to("inventory/inv-9/set");
    assert_eq!(update.len(), 1);
    assert_eq!(json_body(&update[0])["itemuid"], json!("inv-9"));
}

#[tokio::test]
async fn test_save_reports_server_error() {
    let (backend, store) = inventory_store();
    backend.on_json(
        Method::Post,
        "inventory/inv-1/set",
        json!({"status": "Error", "error": "Duplicate VIN"}),
    );
    store.load("inv-1").await;
    store.mutate_field(FieldTarget::Entity, "VIN", "dup");

    assert_eq!(store.save().await, Outcome::Error("Duplicate VIN".into()));
    assert_eq!(store.state(), StoreState::Error("Duplicate VIN".into()));
    assert!(store.is_changed());
}

#[tokio::test]
async fn test_save_reports_transport_exception() {
    let (backend, store) = inventory_store();
    backend.on(Method::Post, "inventory/inv-1/set", |_| {
        Err(ApiError::Transport("connection reset".into()))
    });
    store.load("inv-1").await;

    assert!(matches!(store.save().await, Outcome::Exception(_)));
}

#[tokio::test]
async fn test_save_without_entity_is_error() {
    let (backend, store) = inventory_store();
    assert!(matches!(store.save().await, Outcome::Error(_)));
    assert!(backend.requests().is_empty());
}

// ========================
// Media
// ========================

#[tokio::test]
async fn test_upload_keeps_successful_files_when_one_fails() {
    let (backend, store) = inventory_store();
    let paired = install_media(&backend, "inv-1", "b.jpg");
    store.load("inv-1").await;

    let report = store
        .upload_media(vec![
            UploadFile::new("a.jpg", vec![1, 2, 3]),
            UploadFile::new("b.jpg", vec![4, 5, 6]),
        ])
        .await;

    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file_name, "b.jpg");
    assert!(matches!(report.outcome, Outcome::Error(_)));

    assert_eq!(paired.lock().unwrap().clone(), report.uploaded);
    assert_eq!(store.buckets().photos.len(), 1);
    let images = store.images();
    assert_eq!(images.len(), 1);
    assert!(images[0].src.starts_with("data:image/jpeg;base64,"));
    assert_eq!(store.media_state(), MediaState::Idle);
}

#[tokio::test]
async fn test_upload_pending_media_drains_queue() {
    let (backend, store) = inventory_store();
    install_media(&backend, "inv-1", "none");
    store.load("inv-1").await;

    store.set_upload_files(vec![UploadFile::new("front.png", vec![1])]);
    assert_eq!(store.pending_uploads(), vec!["front.png"]);

    let report = store.upload_pending_media().await;
    assert!(report.is_complete());
    assert!(store.pending_uploads().is_empty());
    assert_eq!(store.images().len(), 1);
}

#[tokio::test]
async fn test_media_requires_saved_item() {
    let (backend, store) = inventory_store();
    store.begin_new();

    assert!(matches!(store.fetch_media().await, Outcome::Error(_)));
    let report = store.upload_media(vec![UploadFile::new("a.jpg", vec![1])]).await;
    assert!(matches!(report.outcome, Outcome::Error(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_fetch_media_replaces_buckets() {
    let (backend, store) = inventory_store();
    install_media(&backend, "inv-1", "none");
    backend.on_json(
        Method::Get,
        "inventory/inv-1/medialist",
        json!([
            {"itemuid": "pair-1", "mediauid": "p1", "contenttype": 0},
            {"itemuid": "pair-2", "mediauid": "v1", "contenttype": 1},
            {"itemuid": "pair-3", "mediauid": "d1", "contenttype": 3}
        ]),
    );
    store.load("inv-1").await;

    assert_eq!(store.fetch_media().await, Outcome::Ok);
    assert_eq!(store.fetch_media().await, Outcome::Ok);

    let buckets = store.buckets();
    assert_eq!(buckets.photos.len(), 1);
    assert_eq!(buckets.videos, vec!["v1"]);
    assert_eq!(buckets.documents, vec!["d1"]);
    assert_eq!(store.images()[0].itemuid, "pair-1");
}

#[tokio::test]
async fn test_remove_media_refreshes_list() {
    let (backend, store) = inventory_store();
    let paired = install_media(&backend, "inv-1", "none");
    store.load("inv-1").await;
    store
        .upload_media(vec![UploadFile::new("a.jpg", vec![1])])
        .await;
    paired.lock().unwrap().clear();

    assert_eq!(store.remove_media("pair-m-rec-1").await, Outcome::Ok);
    assert_eq!(backend.requests_to("media/pair-m-rec-1/delete").len(), 1);
    assert!(store.images().is_empty());
}

#[tokio::test]
async fn test_load_drops_previous_media() {
    let (backend, store) = inventory_store();
    install_media(&backend, "inv-1", "none");
    store.load("inv-1").await;
    store.upload_media(vec![UploadFile::new("a.jpg", vec![1])]).await;
    assert_eq!(store.images().len(), 1);

    store.load("inv-2").await;
    assert!(store.images().is_empty());
    assert!(store.buckets().is_empty());
}

#[tokio::test]
async fn test_load_abandons_media_fetch_for_previous_item() {
    let (backend, store) = inventory_store();
    let paired = install_media(&backend, "inv-1", "none");
    paired.lock().unwrap().push("m-inv1".to_string());
    store.load("inv-1").await;
    let gate = backend.hold("inventory/inv-1/medialist");

    let (fetched, loaded) = tokio::join!(store.fetch_media(), async {
        wait_for_request(&backend, "inventory/inv-1/medialist").await;
        store.load("inv-2").await
    });
    gate.add_permits(1);

    assert_eq!(loaded, Outcome::Ok);
    assert_eq!(fetched, Outcome::Cancelled);
    assert_eq!(store.id().as_deref(), Some("inv-2"));
    assert!(store.buckets().is_empty());
    assert!(store.images().is_empty());
    assert_eq!(store.media_state(), MediaState::Idle);
}

#[tokio::test]
async fn test_pending_uploads_kept_without_item_id() {
    let (backend, store) = inventory_store();
    store.begin_new();
    store.set_upload_files(vec![UploadFile::new("a.jpg", vec![1])]);

    let report = store.upload_pending_media().await;
    assert!(matches!(report.outcome, Outcome::Error(_)));
    assert_eq!(store.pending_uploads(), vec!["a.jpg"]);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_failed_pending_uploads_stay_queued() {
    let (backend, store) = inventory_store();
    install_media(&backend, "inv-1", "b.jpg");
    store.load("inv-1").await;
    store.set_upload_files(vec![
        UploadFile::new("a.jpg", vec![1]),
        UploadFile::new("b.jpg", vec![2]),
    ]);

    let report = store.upload_pending_media().await;
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(store.pending_uploads(), vec!["b.jpg"]);
}

// ========================
// Contacts
// ========================

fn contact_store() -> (Arc<FakeBackend>, ContactStore) {
    let backend = FakeBackend::new();
    backend.on_json(Method::Get, "contacts/c-1/info", contact_fixture());
    install_media(&backend, "unused", "broken.jpg");
    backend.on(Method::Post, "contacts/*/dl", |_| ok(json!({"status": "OK"})));
    let store = ContactStore::new(backend.client());
    (backend, store)
}

#[tokio::test]
async fn test_contact_load_splits_prospects() {
    let (_backend, store) = contact_store();
    assert_eq!(store.load("c-1").await, Outcome::Ok);

    assert_eq!(store.prospects().len(), 1);
    assert_eq!(store.extdata().get_str("PROSPECT1_ID"), Some("p-1"));
    assert_eq!(store.contact_type(), 2);
    assert!(!store.record().contains_key("prospect"));
}

#[tokio::test]
async fn test_contact_save_merges_prospect_ids() {
    let (backend, store) = contact_store();
    backend.on_json(Method::Post, "contacts/c-1/set", json!({"status": "OK", "contactuid": "c-1"}));
    store.load("c-1").await;

    assert_eq!(store.save().await, Outcome::Ok);
    let body = json_body(&backend.requests_to("contacts/c-1/set")[0]);
    assert_eq!(body["prospect"], json!([{"notes": "p-1"}, {"notes": "p-2"}]));

    // Saving again adds nothing
    store.save().await;
    let body = json_body(&backend.requests_to("contacts/c-1/set")[1]);
    assert_eq!(body["prospect"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_new_contact_saves_before_uploading_licence() {
    let (backend, store) = contact_store();
    backend.on_json(Method::Post, "contacts/0/set", json!({"status": "OK", "contactuid": "c-7"}));

    store.begin_new();
    store.mutate_field(FieldTarget::Entity, "firstName", "Grace");
    store.set_dl_file(DlSide::Front, Some(UploadFile::new("front.jpg", vec![1])));
    store.set_dl_file(DlSide::Back, Some(UploadFile::new("back.jpg", vec![2])));

    assert_eq!(store.save().await, Outcome::Ok);
    assert_eq!(store.id().as_deref(), Some("c-7"));

    let requests = backend.requests();
    let save_at = requests.iter().position(|r| r.path == "contacts/0/set").unwrap();
    let first_create = requests.iter().position(|r| r.path.ends_with("/create")).unwrap();
    assert!(save_at < first_create);

    let links: Vec<Value> = backend
        .requests_to("contacts/c-7/dl")
        .iter()
        .map(json_body)
        .collect();
    assert_eq!(links.len(), 2);
    assert!(links.iter().any(|b| b.get("dluidfront").is_some()));
    assert!(links.iter().any(|b| b.get("dluidback").is_some()));

    assert!(store.record().non_empty_str("dluidfront").is_some());
    assert_eq!(store.pending_dl_file(DlSide::Front), None);
}

#[tokio::test]
async fn test_failed_licence_upload_stays_pending() {
    let (backend, store) = contact_store();
    backend.on_json(Method::Post, "contacts/c-1/set", json!({"status": "OK", "contactuid": "c-1"}));
    store.load("c-1").await;
    store.set_dl_file(DlSide::Back, Some(UploadFile::new("broken.jpg", vec![1])));

    assert!(matches!(store.save().await, Outcome::Error(_)));
    assert_eq!(store.pending_dl_file(DlSide::Back).as_deref(), Some("broken.jpg"));
    assert!(backend.requests_to("contacts/c-1/dl").is_empty());
}

#[tokio::test]
async fn test_contact_licence_images() {
    let (backend, store) = contact_store();
    backend.on_json(Method::Post, "contacts/c-1/deletedlfront", json!({"status": "OK"}));
    store.load("c-1").await;

    assert_eq!(store.fetch_dl_images().await, Outcome::Ok);
    let images = store.dl_images();
    assert!(images.get(DlSide::Front).unwrap().starts_with("data:image/jpeg"));
    assert_eq!(images.get(DlSide::Back), None);
    assert_eq!(backend.requests_to("media/dl-front/media").len(), 1);

    assert_eq!(store.remove_dl_image(DlSide::Front).await, Outcome::Ok);
    assert_eq!(store.dl_images().front, None);
    assert_eq!(store.record().get_str("dluidfront"), Some(""));
}

#[tokio::test]
async fn test_load_abandons_licence_fetch_for_previous_contact() {
    let (backend, store) = contact_store();
    backend.on_json(
        Method::Get,
        "contacts/c-2/info",
        json!({"contactuid": "c-2", "firstName": "Alan", "dluidfront": "", "dluidback": ""}),
    );
    store.load("c-1").await;
    let gate = backend.hold("media/dl-front/media");

    let (fetched, loaded) = tokio::join!(store.fetch_dl_images(), async {
        wait_for_request(&backend, "media/dl-front/media").await;
        store.load("c-2").await
    });
    gate.add_permits(1);

    assert_eq!(loaded, Outcome::Ok);
    assert_eq!(fetched, Outcome::Cancelled);
    assert_eq!(store.id().as_deref(), Some("c-2"));
    assert_eq!(store.dl_images(), DlImages::default());
}

#[tokio::test]
async fn test_busy_contact_save_leaves_prospects_alone() {
    let (backend, store) = contact_store();
    store.load("c-1").await;
    let gate = backend.hold("contacts/c-1/info");

    let (reloaded, _) = tokio::join!(store.load("c-1"), async {
        wait_for_request(&backend, "contacts/c-1/info").await;
        while store.state() != StoreState::Loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.save().await, Outcome::Busy);
        assert_eq!(store.prospects().len(), 1);
        assert!(!store.is_changed());
        gate.add_permits(1);
    });

    assert_eq!(reloaded, Outcome::Ok);
    assert!(backend.requests_to("contacts/c-1/set").is_empty());
}

#[tokio::test]
async fn test_contact_clear_resets_extras() {
    let (_backend, store) = contact_store();
    store.load("c-1").await;
    store.set_delete_reason("duplicate");
    store.set_ofac(Record::from_iter([("match", false)]));
    store.set_dl_file(DlSide::Front, Some(UploadFile::new("front.jpg", vec![1])));

    store.clear();
    assert_eq!(store.delete_reason(), "");
    assert!(store.ofac().is_empty());
    assert_eq!(store.pending_dl_file(DlSide::Front), None);
    assert_eq!(store.contact_type(), 0);
    assert_eq!(store.id(), None);
}

// ========================
// Deals, accounts, scopes
// ========================

#[tokio::test]
async fn test_deal_store_round_trip() {
    let backend = FakeBackend::new();
    backend.on_json(
        Method::Get,
        "deals/d-1/info",
        json!({"dealuid": "d-1", "dealtype": 1, "extdata": {"salesperson": "Lee"}}),
    );
    backend.on_json(Method::Post, "deals/d-1/set", json!({"status": "OK", "dealuid": "d-1"}));
    let store = DealStore::new(backend.client());

    assert_eq!(store.load("d-1").await, Outcome::Ok);
    store.mutate_field(FieldTarget::Extension, "salesperson", "Kim");
    assert_eq!(store.save().await, Outcome::Ok);

    let body = json_body(&backend.requests_to("deals/d-1/set")[0]);
    assert_eq!(body["extdata"]["salesperson"], json!("Kim"));
    assert_eq!(body["dealuid"], json!("d-1"));
}

#[tokio::test]
async fn test_edit_scope_clears_on_drop() {
    let backend = FakeBackend::new();
    backend.on_json(Method::Get, "accounts/a-1/info", json!({"accountuid": "a-1"}));
    let store = Arc::new(AccountStore::new(backend.client()));

    {
        let scope = EditScope::open(store.clone());
        assert_eq!(scope.load("a-1").await, Outcome::Ok);
        assert_eq!(store.id().as_deref(), Some("a-1"));
    }
    assert_eq!(store.id(), None);
    assert_eq!(store.state(), StoreState::Idle);
}
