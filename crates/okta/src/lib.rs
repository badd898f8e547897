//! # Catalog Okta
//!
//! Synchronizes Okta groups and users into catalog entities.
//!
//! ## Pipeline
//!
//! ```text
//! DirectoryClient (Okta REST, or a static snapshot)
//!     │
//!     ├──> list_groups ──> per group: list_group_members
//!     │                        └─> map_group (naming, parent, empties)
//!     │
//!     ├──> list_users ──> map_user
//!     │
//!     └──> EntityMutation::Full ──> EntityProviderConnection
//! ```
//!
//! Naming failures are isolated per record: a member that cannot be named is
//! dropped from its group, a group that cannot be named is dropped entirely,
//! and the run always completes. Directory failures abort the run before any
//! mutation is applied.
//!
//! ## Example
//!
//! ```no_run
//! use catalog_okta::{EntityProvider, OktaGroupEntityProvider, OktaProviderConfig};
//! # use std::sync::Arc;
//! # async fn demo(
//! #     cfg: OktaProviderConfig,
//! #     sink: Arc<dyn catalog_okta::EntityProviderConnection>,
//! # ) -> anyhow::Result<()> {
//! let mut provider = OktaGroupEntityProvider::from_config(&cfg)?;
//! provider.connect(sink);
//! provider.run().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod directory;
mod error;
mod kebab;
mod mapper;
mod naming;
mod provider;

pub use client::{next_link, OktaClient, MAX_PAGES, PAGE_LIMIT};
pub use config::OktaProviderConfig;
pub use directory::{
    DirectoryClient, DirectoryGroup, DirectorySnapshot, DirectoryUser, Profile, SnapshotGroup,
    StaticDirectory,
};
pub use error::{ConfigError, DirectoryError, NamingError, ProviderError, Result};
pub use kebab::kebab_case;
pub use mapper::{
    build_group_entities, default_annotations, map_group, map_user, GroupMapping, MappedGroup,
    MappingOptions, MappingOutcome, SkippedRecord,
};
pub use naming::{GroupNamingStrategy, UserNamingStrategy};
pub use provider::{
    EntityProvider, EntityProviderConnection, OktaGroupEntityProvider, OktaOrgEntityProvider,
    OktaUserEntityProvider,
};
