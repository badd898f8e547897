use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, Response as HttpResponse, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{ArgoError, Result};
use crate::service::{AppSelector, ArgoService, FoundApp};

/// Read-only lookup routes, relative to wherever the caller mounts them.
pub fn router(service: Arc<ArgoService>) -> Router {
    Router::new()
        .route("/find/name/:app_name", get(find_by_name))
        .route("/find/selector/:app_selector", get(find_by_selector))
        .route(
            "/argoInstance/:instance_name/applications/name/:app_name",
            get(instance_app_by_name),
        )
        .route(
            "/argoInstance/:instance_name/applications/selector/:app_selector",
            get(instance_apps_by_selector),
        )
        .with_state(service)
}

async fn find_by_name(
    State(service): State<Arc<ArgoService>>,
    Path(app_name): Path<String>,
) -> Json<Vec<FoundApp>> {
    log::info!("Finding instances for app {app_name}");
    Json(service.find_argo_app(&AppSelector::Name(app_name)).await)
}

async fn find_by_selector(
    State(service): State<Arc<ArgoService>>,
    Path(app_selector): Path<String>,
) -> Json<Vec<FoundApp>> {
    log::info!("Finding instances for apps with selector {app_selector}");
    Json(
        service
            .find_argo_app(&AppSelector::Selector(app_selector))
            .await,
    )
}

async fn instance_app_by_name(
    State(service): State<Arc<ArgoService>>,
    Path((instance_name, app_name)): Path<(String, String)>,
) -> Result<Response> {
    log::info!("Getting app {app_name} on {instance_name}");
    let body = service
        .lookup(&instance_name, &AppSelector::Name(app_name))
        .await?;
    relay(body)
}

async fn instance_apps_by_selector(
    State(service): State<Arc<ArgoService>>,
    Path((instance_name, app_selector)): Path<(String, String)>,
) -> Result<Response> {
    log::info!("Getting apps for selector {app_selector} on {instance_name}");
    let body = service
        .lookup(&instance_name, &AppSelector::Selector(app_selector))
        .await?;
    relay(body)
}

fn relay(body: Vec<u8>) -> Result<Response> {
    HttpResponse::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .map_err(|err| ArgoError::Config(format!("cannot build response: {err}")))
}
