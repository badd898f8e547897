use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArgoError>;

pub const INSTANCE_NOT_FOUND_MESSAGE: &str = "cannot find an argo instance to match this cluster";

#[derive(Error, Debug)]
pub enum ArgoError {
    #[error("cannot find an argo instance to match this cluster: {0}")]
    InstanceNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid Argo CD URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("login to {instance} failed with status {status}")]
    Login { instance: String, status: u16 },

    #[error("login to {instance} returned no token")]
    MissingToken { instance: String },

    #[error("Argo CD responded {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("invalid JSON from Argo CD: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("argocd config: {0}")]
    Config(String),
}

impl ArgoError {
    fn name(&self) -> &'static str {
        match self {
            Self::InstanceNotFound(_) => "NotFoundError",
            Self::Http(_) => "HttpError",
            Self::InvalidUrl(_) => "InvalidUrlError",
            Self::Login { .. } | Self::MissingToken { .. } => "AuthenticationError",
            Self::Upstream { .. } => "UpstreamError",
            Self::Decode(_) => "DecodeError",
            Self::Config(_) => "ConfigError",
        }
    }
}

impl IntoResponse for ArgoError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = match &self {
            Self::InstanceNotFound(_) => json!({
                "status": "failed",
                "message": INSTANCE_NOT_FOUND_MESSAGE,
            }),
            other => {
                log::error!("argocd request failed: {other}");
                json!({
                    "error": { "name": other.name(), "message": other.to_string() },
                    "response": { "statusCode": status.as_u16() },
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
