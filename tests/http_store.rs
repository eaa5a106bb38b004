use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{Value, json};
use slidedeck::model::ObjectVariant;
use slidedeck::remote::{AuthSession, Credentials, NoRefresh};
use slidedeck::wire::{
    BorderDto, BorderTypeDto, RenameDesignRequest, ShareDesignRequest, UpdateElementRequest, UploadImageRequest,
};
use slidedeck::{DeckConfig, DeckError, HttpStore, RemoteStore, SyncEngine};

// =============================================================================
// STUB SERVER
// =============================================================================

#[derive(Clone, Default)]
struct Seen {
    headers: Arc<Mutex<Vec<(String, String)>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    fields: Arc<Mutex<Vec<(String, usize)>>>,
}

async fn design(State(seen): State<Seen>, Path(id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    for name in ["authorization", "refresh-token"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            seen.headers.lock().unwrap().push((name.to_owned(), value.to_owned()));
        }
    }
    Json(json!({
        "id": id,
        "name": "Quarterly review",
        "shared": true,
        "slides": [{
            "id": 7,
            "elements": [
                {"id": 1, "x": 10.0, "y": 20.0, "width": 100.0, "height": 50.0, "rotation": 0.0, "z": 0,
                 "type": "SHAPE", "path": "rect", "color": "#ff0000",
                 "borderType": "NONE", "borderColor": "#000000", "borderThickness": 0.0},
                {"id": 2, "x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0, "rotation": 0.0, "z": 1,
                 "type": "HOLOGRAM"}
            ]
        }]
    }))
}

async fn animations() -> Json<Value> {
    Json(json!([{"id": 30, "elementId": 1, "effect": "FADE_IN", "timing": "ON_CLICK", "duration": 500}]))
}

async fn rename(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
    seen.bodies.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

async fn upload_image(State(seen): State<Seen>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let len = field.bytes().await.unwrap().len();
        seen.fields.lock().unwrap().push((name, len));
    }
    Json(json!({"url": "/content/uploaded.png", "borderType": "NONE", "borderColor": "#000000", "borderThickness": 0.0}))
}

async fn spawn_stub() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/design/{id}", get(design))
        .route("/animation", get(animations))
        .route("/design/name", patch(rename))
        .route("/element/image", patch(upload_image))
        .route("/design/share", patch(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database offline") }))
        .route("/element", patch(|| async { StatusCode::UNAUTHORIZED }))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn signed_in() -> Arc<AuthSession> {
    Arc::new(AuthSession::with_credentials(Credentials {
        access_token: "access-1".into(),
        refresh_token: Some("refresh-1".into()),
        user_id: 42,
        name: "Ada".into(),
        email: "ada@example.com".into(),
    }))
}

fn store(base: &str, auth: Arc<AuthSession>) -> HttpStore {
    HttpStore::new(&DeckConfig::new(base), auth).unwrap()
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn get_design_parses_payload_and_sends_credentials() {
    let (base, seen) = spawn_stub().await;
    let design = store(&base, signed_in()).get_design(5).await.unwrap();

    assert_eq!(design.id, 5);
    assert_eq!(design.name, "Quarterly review");
    assert!(design.shared);
    assert_eq!(design.slides[0].elements.len(), 2);

    let headers = seen.headers.lock().unwrap().clone();
    assert!(headers.contains(&("authorization".into(), "Bearer access-1".into())));
    assert!(headers.contains(&("refresh-token".into(), "refresh-1".into())));
}

#[tokio::test]
async fn signed_out_requests_carry_no_credentials() {
    let (base, seen) = spawn_stub().await;
    store(&base, Arc::new(AuthSession::new(NoRefresh)))
        .get_design(5)
        .await
        .unwrap();
    assert!(seen.headers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unauthorized_status_maps_to_unauthorized() {
    let (base, _) = spawn_stub().await;
    let err = store(&base, signed_in())
        .update_element(&UpdateElementRequest {
            user_id: 42,
            element_id: 1,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            rotation: 0.0,
            z: 0,
            border: BorderDto {
                border_type: BorderTypeDto::None,
                border_color: "#000000".into(),
                border_thickness: 0.0,
            },
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let (base, _) = spawn_stub().await;
    let err = store(&base, signed_in())
        .share_design(&ShareDesignRequest { user_id: 42, design_id: 5, shared: true })
        .await
        .unwrap_err();
    match err {
        DeckError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database offline");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn rename_sends_camel_case_json() {
    let (base, seen) = spawn_stub().await;
    store(&base, signed_in())
        .rename_design(&RenameDesignRequest { user_id: 42, design_id: 5, name: "Renamed".into() })
        .await
        .unwrap();

    let bodies = seen.bodies.lock().unwrap().clone();
    assert_eq!(bodies, vec![json!({"userId": 42, "designId": 5, "name": "Renamed"})]);
}

#[tokio::test]
async fn image_upload_is_multipart() {
    let (base, seen) = spawn_stub().await;
    let image = store(&base, signed_in())
        .upload_image(&UploadImageRequest { user_id: 42, element_id: 9, file: vec![1, 2, 3, 4] })
        .await
        .unwrap();

    assert_eq!(image.url, "/content/uploaded.png");
    let fields = seen.fields.lock().unwrap().clone();
    assert!(fields.contains(&("userId".into(), 2)));
    assert!(fields.contains(&("elementId".into(), 1)));
    assert!(fields.contains(&("file".into(), 4)));
}

#[tokio::test]
async fn engine_loads_design_over_http() {
    let (base, _) = spawn_stub().await;
    let config = DeckConfig::new(base.as_str());
    let auth = signed_in();
    let store: Arc<dyn RemoteStore> = Arc::new(store(&base, Arc::clone(&auth)));

    let engine = SyncEngine::load(store, auth, &config, 5).await.unwrap();
    let doc = engine.document();
    assert_eq!(doc.title, "Quarterly review");
    let slide = &doc.slides()[0];
    assert_eq!(slide.id, 7);
    assert!(matches!(slide.elements()[0].object, ObjectVariant::Shape(_)));
    assert!(matches!(slide.elements()[1].object, ObjectVariant::Invalid));
    assert_eq!(slide.animations().len(), 1);
}
