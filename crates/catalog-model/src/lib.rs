//! # Catalog Model
//!
//! Entity shapes understood by the software catalog, plus the mutation
//! envelope that entity providers hand to their catalog connection.
//!
//! ```text
//! provider run
//!     │
//!     ├──> Entity (Group | User)
//!     │      └─> DeferredEntity { entity, locationKey }
//!     │
//!     └──> EntityMutation::Full { entities }
//!            └─> catalog connection
//! ```

use anyhow::Result;
use serde::Serialize;

mod entity;
mod name;

pub use entity::{
    DeferredEntity, Entity, EntityMetadata, EntityMutation, GroupEntity, GroupSpec, UserEntity,
    UserProfile, UserSpec, API_VERSION, GROUP_TYPE,
};
pub use name::{validate_entity_name, EntityNameError, MAX_ENTITY_NAME_LEN};

pub const ANNOTATION_LOCATION: &str = "backstage.io/managed-by-location";
pub const ANNOTATION_ORIGIN_LOCATION: &str = "backstage.io/managed-by-origin-location";

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// JSON Schema for the mutation envelope, for consumers that validate
/// provider output.
pub fn mutation_schema() -> Result<serde_json::Value> {
    let schema = schemars::schema_for!(EntityMutation);
    Ok(serde_json::to_value(&schema)?)
}
