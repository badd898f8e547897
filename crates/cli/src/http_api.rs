use crate::server_security::{BearerToken, AUTH_TOKEN_ENV};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Response as HttpResponse, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use catalog_model::serialize_json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: ErrorEnvelope,
}

#[derive(Serialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) code: String,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) hint: Option<String>,
}

pub(crate) fn is_authorized(headers: &HeaderMap, token: &BearerToken) -> bool {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    token.accepts(value)
}

pub(crate) fn error_response(code: &str, message: String) -> ErrorBody {
    let hint = match code {
        "unauthorized" => Some(format!(
            "The proxy was started with an auth token ({AUTH_TOKEN_ENV} or --auth-token); include Authorization: Bearer <token>."
        )),
        _ => None,
    };

    ErrorBody {
        error: ErrorEnvelope {
            code: code.to_string(),
            message,
            hint,
        },
    }
}

pub(crate) fn build_response(status: StatusCode, body: &impl Serialize) -> Response {
    let Ok(json) = serialize_json(body) else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut builder = HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json");

    if status == StatusCode::UNAUTHORIZED {
        builder = builder.header("www-authenticate", "Bearer");
    }

    builder
        .body(Body::from(json))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Rejects requests without the bearer token when one is configured.
pub(crate) async fn require_auth(
    State(token): State<Arc<Option<BearerToken>>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(token) = token.as_ref() {
        if !is_authorized(request.headers(), token) {
            let body = error_response(
                "unauthorized",
                "Missing or invalid Authorization header".to_string(),
            );
            return build_response(StatusCode::UNAUTHORIZED, &body);
        }
    }
    next.run(request).await
}
