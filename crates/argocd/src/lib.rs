//! # Argo CD proxy
//!
//! Resolves a configured Argo CD instance by name, authenticates against it
//! (static token or session login) and relays application lookups.
//!
//! ```text
//! GET /find/name/:app                                   ─┐
//! GET /find/selector/:selector                           ├─> every instance, aggregated
//! GET /argoInstance/:instance/applications/name/:app     ─┐
//! GET /argoInstance/:instance/applications/selector/:sel  ├─> one instance, body relayed verbatim
//! ```

mod config;
mod error;
mod router;
mod service;

pub use config::{AppLocatorMethod, ArgoConfig, ArgoInstance, DEFAULT_PASSWORD, DEFAULT_USERNAME};
pub use error::{ArgoError, Result, INSTANCE_NOT_FOUND_MESSAGE};
pub use router::router;
pub use service::{AppSelector, ArgoService, FoundApp};
