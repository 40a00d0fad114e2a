use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adwizard_core::draft::{CreateDraft, DraftId, DraftPatch, MediaId};
use adwizard_core::error::RemoteError;
use adwizard_core::remote::{DraftApi, UploadFile};
use adwizard_http::{HttpBackend, HttpSettings};
use adwizard_schema::{CatalogLookup, SchemaLookup};
use adwizard_test_support::fixtures::vehicle_schema_json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

const TOKEN: &str = "s3cret";

#[derive(Debug, Clone, PartialEq)]
struct UploadedPart {
    field: String,
    file_name: String,
    content_type: String,
    len: usize,
}

#[derive(Clone, Default)]
struct Backend {
    auth: Arc<Mutex<Vec<Option<String>>>>,
    parts: Arc<Mutex<Vec<UploadedPart>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl Backend {
    fn note_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.auth.lock().unwrap().push(value);
    }
}

async fn create_draft(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<CreateDraft>,
) -> Response {
    backend.note_auth(&headers);
    if body.category.is_empty() {
        return (StatusCode::BAD_REQUEST, "category missing").into_response();
    }
    Json(json!({ "draft_id": "d-100" })).into_response()
}

async fn patch_draft(Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if id == "gone" {
        return (StatusCode::NOT_FOUND, "no such draft").into_response();
    }
    Json(body).into_response()
}

async fn upload_media(
    State(backend): State<Backend>,
    Path(_id): Path<String>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut acknowledged = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.unwrap();
        let n = acknowledged.len() + 1;
        acknowledged.push(json!({
            "media_id": format!("srv-{n}"),
            "url": format!("https://cdn.example.test/srv-{n}.jpg"),
        }));
        backend.parts.lock().unwrap().push(UploadedPart {
            field: name,
            file_name,
            content_type,
            len: bytes.len(),
        });
    }
    Json(Value::Array(acknowledged))
}

async fn reorder_media(Json(body): Json<Value>) -> Json<Value> {
    let cover = body["cover_id"].clone();
    let list: Vec<Value> = body["order"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|id| {
            json!({
                "media_id": id,
                "url": format!("https://cdn.example.test/{}.jpg", id.as_str().unwrap_or_default()),
                "is_cover": id == cover,
            })
        })
        .collect();
    Json(Value::Array(list))
}

async fn submit_draft(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "rejected" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "validation_errors": [
                    { "field": "price_amount", "code": "OUT_OF_RANGE", "message": "Price is too high." },
                    { "field": "attributes.mileage", "code": "REQUIRED", "message": "Mileage is required." }
                ]
            })),
        )
            .into_response(),
        "unprocessable" => (StatusCode::UNPROCESSABLE_ENTITY, "not json").into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "panic at handler.rs:42").into_response(),
        "garbled" => Json(json!({ "unexpected": true })).into_response(),
        _ => Json(json!({ "detail_url": format!("https://ads.example.test/listing/{id}") }))
            .into_response(),
    }
}

async fn category_schema(Path(category): Path<String>) -> Response {
    match category.as_str() {
        "otomobil" => Json(vehicle_schema_json()).into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({})).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown category").into_response(),
    }
}

async fn makes(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.queries.lock().unwrap().push(query);
    Json(json!([{ "id": "bmw", "name": "BMW" }, { "id": "vw", "name": "Volkswagen" }]))
}

async fn models(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let make = query.get("make").cloned().unwrap_or_default();
    backend.queries.lock().unwrap().push(query);
    if make == "bmw" {
        Json(json!([{ "id": "320d", "name": "320d" }]))
    } else {
        Json(json!([]))
    }
}

fn router(backend: Backend) -> Router {
    Router::new()
        .route("/api/drafts", post(create_draft))
        .route("/api/drafts/{id}", patch(patch_draft))
        .route("/api/drafts/{id}/media", post(upload_media))
        .route("/api/drafts/{id}/media/order", put(reorder_media))
        .route("/api/drafts/{id}/submit", post(submit_draft))
        .route("/api/categories/{category}/schema", get(category_schema))
        .route("/api/catalog/makes", get(makes))
        .route("/api/catalog/models", get(models))
        .with_state(backend)
}

async fn spawn(backend: Backend) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(backend)).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/api/")).unwrap()
}

async fn client(backend: Backend) -> HttpBackend {
    let mut settings = HttpSettings::new(spawn(backend).await);
    settings.token = Some(TOKEN.to_owned());
    HttpBackend::new(settings).unwrap()
}

fn id(value: &str) -> DraftId {
    DraftId(value.to_owned())
}

#[tokio::test]
async fn test_create_draft_sends_bearer_token_and_returns_id() {
    // Arrange
    let backend = Backend::default();
    let http = client(backend.clone()).await;
    let request = CreateDraft {
        category: "otomobil".into(),
        module: "vehicle".into(),
        country: "DE".into(),
    };

    // Act
    let draft_id = http.create_draft(&request).await.unwrap();

    // Assert
    assert_eq!(draft_id, id("d-100"));
    assert_eq!(
        backend.auth.lock().unwrap().as_slice(),
        &[Some(format!("Bearer {TOKEN}"))]
    );
}

#[tokio::test]
async fn test_patch_draft_returns_accepted_echo() {
    let http = client(Backend::default()).await;
    let patch = DraftPatch {
        title: Some("BMW 320d Touring".into()),
        year: Some(2019),
        ..DraftPatch::default()
    };

    let accepted = http.patch_draft(&id("d-100"), &patch).await.unwrap();

    assert_eq!(accepted, patch);
}

#[tokio::test]
async fn test_patch_unknown_draft_maps_to_status() {
    let http = client(Backend::default()).await;

    let err = http
        .patch_draft(&id("gone"), &DraftPatch::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RemoteError::Status {
            status: 404,
            body: "no such draft".into()
        }
    );
}

#[tokio::test]
async fn test_upload_media_sends_one_part_per_file() {
    // Arrange
    let backend = Backend::default();
    let http = client(backend.clone()).await;
    let files = vec![
        UploadFile {
            file_name: "front.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: Arc::from(vec![0xFF_u8, 0xD8, 0xFF, 0xD9]),
        },
        UploadFile {
            file_name: "manual.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: Arc::from(vec![b'%', b'P', b'D', b'F', b'-']),
        },
    ];

    // Act
    let uploaded = http.upload_media(&id("d-100"), &files).await.unwrap();

    // Assert
    let ids: Vec<&str> = uploaded.iter().map(|m| m.media_id.0.as_str()).collect();
    assert_eq!(ids, vec!["srv-1", "srv-2"]);
    let parts = backend.parts.lock().unwrap().clone();
    assert_eq!(
        parts,
        vec![
            UploadedPart {
                field: "files".into(),
                file_name: "front.jpg".into(),
                content_type: "image/jpeg".into(),
                len: 4,
            },
            UploadedPart {
                field: "files".into(),
                file_name: "manual.pdf".into(),
                content_type: "application/pdf".into(),
                len: 5,
            },
        ]
    );
}

#[tokio::test]
async fn test_reorder_media_returns_canonical_list() {
    let http = client(Backend::default()).await;
    let order = [MediaId("m2".into()), MediaId("m1".into())];

    let canonical = http
        .reorder_media(&id("d-100"), &order, &MediaId("m2".into()))
        .await
        .unwrap();

    assert_eq!(canonical.len(), 2);
    assert_eq!(canonical[0].media_id, MediaId("m2".into()));
    assert!(canonical[0].is_cover);
    assert!(!canonical[1].is_cover);
}

#[tokio::test]
async fn test_submit_returns_detail_url() {
    let http = client(Backend::default()).await;

    let receipt = http.submit_draft(&id("d-100")).await.unwrap();

    assert_eq!(receipt.detail_url, "https://ads.example.test/listing/d-100");
}

#[tokio::test]
async fn test_submit_422_maps_to_rejected_field_errors() {
    let http = client(Backend::default()).await;

    let err = http.submit_draft(&id("rejected")).await.unwrap_err();

    let RemoteError::Rejected(errors) = err else {
        panic!("expected a rejection, got {err:?}");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["price_amount", "attributes.mileage"]);
    assert_eq!(errors[0].code, "OUT_OF_RANGE");
}

#[tokio::test]
async fn test_submit_422_without_error_body_is_a_status_error() {
    let http = client(Backend::default()).await;

    let err = http.submit_draft(&id("unprocessable")).await.unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 422, .. }));
}

#[tokio::test]
async fn test_submit_server_error_keeps_body_out_of_summary() {
    let http = client(Backend::default()).await;

    let err = http.submit_draft(&id("broken")).await.unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 500, ref body } if body.contains("handler.rs")));
    assert!(!err.summary().contains("handler.rs"));
}

#[tokio::test]
async fn test_unexpected_success_body_is_a_decode_error() {
    let http = client(Backend::default()).await;

    let err = http.submit_draft(&id("garbled")).await.unwrap_err();

    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_schema_lookup_returns_payload_and_404_for_unknown() {
    let http = client(Backend::default()).await;

    let schema = http.schema_for("otomobil").await.unwrap();
    let missing = http.schema_for("yacht").await.unwrap_err();

    assert_eq!(schema, vehicle_schema_json());
    assert!(matches!(missing, RemoteError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_timeout_maps_to_transport_error() {
    // Arrange
    let mut settings = HttpSettings::new(spawn(Backend::default()).await);
    settings.timeout = Duration::from_millis(200);
    let http = HttpBackend::new(settings).unwrap();

    // Act
    let err = http.schema_for("slow").await.unwrap_err();

    // Assert
    assert!(matches!(err, RemoteError::Transport(_)));
}

#[tokio::test]
async fn test_catalog_passes_country_and_make_as_query() {
    // Arrange
    let backend = Backend::default();
    let http = client(backend.clone()).await;

    // Act
    let makes = http.makes("DE").await.unwrap();
    let models = http.models("DE", "bmw").await.unwrap();

    // Assert
    assert_eq!(makes.len(), 2);
    assert_eq!(makes[1].name, "Volkswagen");
    assert_eq!(models[0].id, "320d");
    let queries = backend.queries.lock().unwrap().clone();
    assert_eq!(queries[0].get("country").map(String::as_str), Some("DE"));
    assert_eq!(queries[1].get("make").map(String::as_str), Some("bmw"));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let http = HttpBackend::new(HttpSettings::new(
        Url::parse(&format!("http://{addr}/")).unwrap(),
    ))
    .unwrap();

    let err = http.makes("DE").await.unwrap_err();

    assert!(matches!(err, RemoteError::Transport(_)));
}
