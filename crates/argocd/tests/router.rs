use argocd_proxy::{router, AppLocatorMethod, ArgoConfig, ArgoInstance, ArgoService};
use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const GUESTBOOK: &str = r#"{"metadata":{"name":"guestbook","namespace":"argocd"},"status":{"sync":{"status":"Synced"}}}"#;

#[derive(Clone, Default)]
struct FakeArgo {
    logins: Arc<AtomicUsize>,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn session(State(fake): State<FakeArgo>, Json(body): Json<Value>) -> Response {
    fake.logins.fetch_add(1, Ordering::SeqCst);
    if body["password"] == "wrong" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "token": "login-token" })).into_response()
}

async fn application(Path(name): Path<String>, headers: HeaderMap) -> Response {
    if !matches!(bearer(&headers), Some("static-token" | "login-token")) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match name.as_str() {
        "guestbook" => ([(header::CONTENT_TYPE, "application/json")], GUESTBOOK).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "applications.argoproj.io not found", "code": 5 })),
        )
            .into_response(),
    }
}

async fn applications(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if bearer(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match query.get("selector").map(String::as_str) {
        Some("team=web") => Json(json!({
            "metadata": {},
            "items": [
                { "metadata": { "name": "guestbook" } },
                { "metadata": { "name": "storefront" } }
            ]
        }))
        .into_response(),
        _ => Json(json!({ "metadata": {} })).into_response(),
    }
}

async fn spawn_fake() -> (FakeArgo, String) {
    let fake = FakeArgo::default();
    let app = Router::new()
        .route("/api/v1/session", post(session))
        .route("/api/v1/applications", get(applications))
        .route("/api/v1/applications/:name", get(application))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (fake, format!("http://{addr}"))
}

fn config(instances: Vec<ArgoInstance>) -> ArgoConfig {
    ArgoConfig {
        app_locator_methods: vec![AppLocatorMethod {
            kind: "config".to_string(),
            instances,
        }],
        ..ArgoConfig::default()
    }
}

async fn setup() -> (FakeArgo, Router) {
    let (fake, base) = spawn_fake().await;
    let cfg = config(vec![
        ArgoInstance::new("static", &base).with_token("static-token"),
        ArgoInstance::new("login", &base),
        ArgoInstance::new("offline", "http://127.0.0.1:1"),
        ArgoInstance::new("locked", &base).with_credentials("ops", "wrong"),
    ]);
    let service = Arc::new(ArgoService::new(&cfg).unwrap());
    (fake, router(service))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn unknown_instance_returns_failed_status() {
    let (fake, app) = setup().await;

    let (status, body) = get_json(app, "/argoInstance/nope/applications/name/guestbook").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({
            "status": "failed",
            "message": "cannot find an argo instance to match this cluster"
        })
    );
    assert_eq!(fake.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn static_token_skips_login_and_relays_body_verbatim() {
    let (fake, app) = setup().await;

    let (status, body) = get_json(app, "/argoInstance/static/applications/name/guestbook").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), GUESTBOOK);
    assert_eq!(fake.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_token_logs_in_once() {
    let (fake, app) = setup().await;

    let (status, body) = get_json(app, "/argoInstance/login/applications/name/guestbook").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), GUESTBOOK);
    assert_eq!(fake.logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn selector_lookup_on_one_instance() {
    let (_fake, app) = setup().await;

    let (status, body) =
        get_json(app, "/argoInstance/static/applications/selector/team=web").await;
    assert_eq!(status, StatusCode::OK);
    let data: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(data["items"][1]["metadata"]["name"], "storefront");
}

#[tokio::test]
async fn upstream_failure_maps_to_generic_error() {
    let (_fake, app) = setup().await;

    let (status, body) = get_json(app, "/argoInstance/static/applications/name/missing").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let data: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(data["error"]["name"], "UpstreamError");
    assert_eq!(data["response"], json!({ "statusCode": 500 }));
}

#[tokio::test]
async fn rejected_login_maps_to_generic_error() {
    let (_fake, app) = setup().await;

    let (status, body) = get_json(app, "/argoInstance/locked/applications/name/guestbook").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let data: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(data["error"]["name"], "AuthenticationError");
}

#[tokio::test]
async fn find_by_name_skips_failing_instances() {
    let (_fake, app) = setup().await;

    let (status, body) = get_json(app, "/find/name/guestbook").await;
    assert_eq!(status, StatusCode::OK);
    let found: Value = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["static", "login"]);
    assert_eq!(found[0]["appName"], json!(["guestbook"]));
}

#[tokio::test]
async fn find_by_selector_collects_item_names() {
    let (_fake, app) = setup().await;

    let (_, body) = get_json(app.clone(), "/find/selector/team=web").await;
    let found: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(found[0]["appName"], json!(["guestbook", "storefront"]));
    assert_eq!(found.as_array().unwrap().len(), 2);

    let (status, body) = get_json(app, "/find/selector/team=none").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
}

#[tokio::test]
async fn unknown_app_is_absent_from_find() {
    let (_fake, app) = setup().await;

    let (_, body) = get_json(app, "/find/name/missing").await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
}
