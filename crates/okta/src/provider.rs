use async_trait::async_trait;
use catalog_model::{DeferredEntity, EntityMutation};
use std::sync::Arc;

use crate::client::OktaClient;
use crate::config::OktaProviderConfig;
use crate::directory::DirectoryClient;
use crate::error::{ProviderError, Result};
use crate::mapper::{map_group, map_user, MappingOptions, MappingOutcome};

/// The catalog side of a provider: receives one full mutation per run.
#[async_trait]
pub trait EntityProviderConnection: Send + Sync {
    async fn apply_mutation(&self, mutation: EntityMutation) -> anyhow::Result<()>;
}

#[async_trait]
pub trait EntityProvider: Send + Sync {
    /// Stable key; every entity this provider emits carries it as `locationKey`.
    fn provider_name(&self) -> String;

    fn connect(&mut self, connection: Arc<dyn EntityProviderConnection>);

    /// Reads the directory and replaces this provider's entities in the catalog.
    async fn run(&self) -> Result<()>;
}

struct ProviderCore {
    client: Arc<dyn DirectoryClient>,
    org_url: String,
    group_filter: Option<String>,
    user_filter: Option<String>,
    options: MappingOptions,
    connection: Option<Arc<dyn EntityProviderConnection>>,
}

impl ProviderCore {
    fn new(client: Arc<dyn DirectoryClient>, cfg: &OktaProviderConfig) -> Self {
        Self {
            client,
            org_url: cfg.org_url.trim().to_string(),
            group_filter: cfg.group_filter.clone(),
            user_filter: cfg.user_filter.clone(),
            options: cfg.mapping_options(),
            connection: None,
        }
    }

    fn from_config(cfg: &OktaProviderConfig) -> Result<Self> {
        cfg.validate()?;
        let client = OktaClient::new(cfg.org_url.trim(), cfg.token.trim())?;
        Ok(Self::new(Arc::new(client), cfg))
    }

    fn name(&self, kind: &str) -> String {
        format!("okta-{kind}-{}", self.org_url)
    }

    fn connection(&self, provider: String) -> Result<Arc<dyn EntityProviderConnection>> {
        self.connection
            .clone()
            .ok_or(ProviderError::NotConnected { provider })
    }

    /// Members are listed one group at a time, right before that group is
    /// mapped.
    async fn group_entities(&self, location_key: &str) -> Result<Vec<DeferredEntity>> {
        let groups = self
            .client
            .list_groups(self.group_filter.as_deref())
            .await?;

        let mut outcome = MappingOutcome::default();
        for group in &groups {
            let members = self.client.list_group_members(&group.id).await?;
            outcome.absorb(map_group(group, &members, &self.options));
        }

        log::info!(
            "{location_key}: {} groups listed, {} emitted, {} empty, {} skipped, {} members skipped",
            groups.len(),
            outcome.entities.len(),
            outcome.empty_groups.len(),
            outcome.skipped_groups.len(),
            outcome.skipped_members.len()
        );

        Ok(outcome
            .entities
            .into_iter()
            .map(|entity| DeferredEntity::new(entity, location_key))
            .collect())
    }

    async fn user_entities(&self, location_key: &str) -> Result<Vec<DeferredEntity>> {
        let users = self.client.list_users(self.user_filter.as_deref()).await?;

        let mut entities = Vec::with_capacity(users.len());
        for user in &users {
            match map_user(user, &self.options.user_naming, &self.options.annotations) {
                Ok(entity) => entities.push(DeferredEntity::new(entity, location_key)),
                Err(reason) => log::warn!("Skipping user {}: {reason}", user.id),
            }
        }

        log::info!(
            "{location_key}: {} users listed, {} emitted",
            users.len(),
            entities.len()
        );
        Ok(entities)
    }
}

async fn apply_full(
    connection: Arc<dyn EntityProviderConnection>,
    entities: Vec<DeferredEntity>,
) -> Result<()> {
    connection
        .apply_mutation(EntityMutation::full(entities))
        .await
        .map_err(|err| ProviderError::Sink(format!("{err:#}")))
}

macro_rules! provider_common {
    ($ty:ident) => {
        impl $ty {
            pub fn new(client: Arc<dyn DirectoryClient>, cfg: &OktaProviderConfig) -> Self {
                Self {
                    core: ProviderCore::new(client, cfg),
                }
            }

            /// Builds an [`OktaClient`] from the config.
            pub fn from_config(cfg: &OktaProviderConfig) -> Result<Self> {
                Ok(Self {
                    core: ProviderCore::from_config(cfg)?,
                })
            }

            /// Replaces the mapping options derived from config, e.g. to plug
            /// in custom naming strategies.
            #[must_use]
            pub fn with_options(mut self, options: MappingOptions) -> Self {
                self.core.options = options;
                self
            }

            #[must_use]
            pub fn options(&self) -> &MappingOptions {
                &self.core.options
            }
        }
    };
}

/// Emits one Group entity per directory group.
pub struct OktaGroupEntityProvider {
    core: ProviderCore,
}

provider_common!(OktaGroupEntityProvider);

#[async_trait]
impl EntityProvider for OktaGroupEntityProvider {
    fn provider_name(&self) -> String {
        self.core.name("group")
    }

    fn connect(&mut self, connection: Arc<dyn EntityProviderConnection>) {
        self.core.connection = Some(connection);
    }

    async fn run(&self) -> Result<()> {
        let name = self.provider_name();
        let connection = self.core.connection(name.clone())?;
        let entities = self.core.group_entities(&name).await?;
        apply_full(connection, entities).await
    }
}

/// Emits one User entity per directory user matching `user_filter`.
pub struct OktaUserEntityProvider {
    core: ProviderCore,
}

provider_common!(OktaUserEntityProvider);

#[async_trait]
impl EntityProvider for OktaUserEntityProvider {
    fn provider_name(&self) -> String {
        self.core.name("user")
    }

    fn connect(&mut self, connection: Arc<dyn EntityProviderConnection>) {
        self.core.connection = Some(connection);
    }

    async fn run(&self) -> Result<()> {
        let name = self.provider_name();
        let connection = self.core.connection(name.clone())?;
        let entities = self.core.user_entities(&name).await?;
        apply_full(connection, entities).await
    }
}

/// Users and groups in a single mutation, users first.
pub struct OktaOrgEntityProvider {
    core: ProviderCore,
}

provider_common!(OktaOrgEntityProvider);

#[async_trait]
impl EntityProvider for OktaOrgEntityProvider {
    fn provider_name(&self) -> String {
        self.core.name("org")
    }

    fn connect(&mut self, connection: Arc<dyn EntityProviderConnection>) {
        self.core.connection = Some(connection);
    }

    async fn run(&self) -> Result<()> {
        let name = self.provider_name();
        let connection = self.core.connection(name.clone())?;
        let mut entities = self.core.user_entities(&name).await?;
        entities.extend(self.core.group_entities(&name).await?);
        apply_full(connection, entities).await
    }
}
