use anyhow::{Context as AnyhowContext, Result};
use argocd_proxy::ArgoService;
use axum::{middleware, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::server_security::{BearerToken, Exposure, AUTH_TOKEN_ENV};
use crate::{http_api, print_stdout, ServeArgs};

pub(crate) const ARGOCD_MOUNT: &str = "/api/argocd";

pub(crate) fn build_app(service: ArgoService, auth_token: Option<BearerToken>) -> Router {
    let instances = service.instances().len();
    Router::new()
        .nest(ARGOCD_MOUNT, argocd_proxy::router(Arc::new(service)))
        .route(
            "/health",
            get(move || async move { Json(json!({ "status": "ok", "instances": instances })) }),
        )
        .layer(middleware::from_fn_with_state(
            Arc::new(auth_token),
            http_api::require_auth,
        ))
}

pub(crate) async fn serve_argocd(args: ServeArgs) -> Result<()> {
    let exposure = Exposure::resolve(&args.bind, args.public, args.auth_token.as_deref()).await?;

    let config = AppConfig::load(args.config.as_deref())?;
    let service = ArgoService::new(config.argocd()?).context("Invalid [argocd] config")?;
    if service.instances().is_empty() {
        log::warn!("No Argo CD instances configured; every lookup will fail");
    }

    let auth_enabled = exposure.token.is_some();
    let app = build_app(service, exposure.token);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving Argo CD proxy: {base_url}{ARGOCD_MOUNT}"))?;
    print_stdout(&format!("Health endpoint: {base_url}/health"))?;
    if auth_enabled {
        print_stdout(&format!(
            "Auth enabled: add header 'Authorization: Bearer ${AUTH_TOKEN_ENV}'"
        ))?;
    }
    if exposure.public {
        let addrs = exposure
            .addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!(
        "Try: curl {base_url}{ARGOCD_MOUNT}/find/name/<app>"
    ))?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argocd_proxy::ArgoConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(token: Option<&str>) -> Router {
        let service = ArgoService::new(&ArgoConfig::default()).unwrap();
        build_app(service, token.map(|t| BearerToken::new(t).unwrap()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_open_without_token() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "ok", "instances": 0 })
        );
    }

    #[tokio::test]
    async fn token_guards_every_route() {
        let response = app(Some("secret"))
            .oneshot(
                Request::get("/api/argocd/find/name/guestbook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "unauthorized");

        let response = app(Some("secret"))
            .oneshot(
                Request::get("/api/argocd/find/name/guestbook")
                    .header(AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn proxy_errors_pass_through_the_mount() {
        let response = app(None)
            .oneshot(
                Request::get("/api/argocd/argoInstance/nope/applications/name/guestbook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["status"], "failed");
    }
}
