use anyhow::{anyhow, Context as AnyhowContext, Result};
use async_trait::async_trait;
use catalog_model::{serialize_json_pretty, EntityMutation};
use catalog_okta::{
    DirectoryClient, EntityProvider, EntityProviderConnection, OktaGroupEntityProvider,
    OktaOrgEntityProvider, OktaProviderConfig, OktaUserEntityProvider, StaticDirectory,
};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::config::AppConfig;
use crate::{print_stdout, SyncArgs};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ProviderKind {
    /// Users and groups together
    #[default]
    Org,
    Group,
    User,
}

/// One provider's mutation, as written to the output document.
#[derive(Serialize)]
pub(crate) struct ProviderOutput {
    pub(crate) provider: String,
    pub(crate) mutation: EntityMutation,
}

type Batch = Arc<Mutex<Vec<ProviderOutput>>>;

/// Collects mutations for the current pass; the pass writes them out as one
/// JSON document.
struct BatchSink {
    provider: String,
    batch: Batch,
}

#[async_trait]
impl EntityProviderConnection for BatchSink {
    async fn apply_mutation(&self, mutation: EntityMutation) -> anyhow::Result<()> {
        log::debug!(
            "{}: received {} entities",
            self.provider,
            mutation.entities().len()
        );
        self.batch
            .lock()
            .map_err(|_| anyhow!("output batch lock poisoned"))?
            .push(ProviderOutput {
                provider: self.provider.clone(),
                mutation,
            });
        Ok(())
    }
}

fn build_provider(
    kind: ProviderKind,
    cfg: &OktaProviderConfig,
    fixture: Option<Arc<dyn DirectoryClient>>,
) -> Result<Box<dyn EntityProvider>> {
    let provider: Box<dyn EntityProvider> = match (kind, fixture) {
        (ProviderKind::Org, Some(dir)) => Box::new(OktaOrgEntityProvider::new(dir, cfg)),
        (ProviderKind::Org, None) => Box::new(OktaOrgEntityProvider::from_config(cfg)?),
        (ProviderKind::Group, Some(dir)) => Box::new(OktaGroupEntityProvider::new(dir, cfg)),
        (ProviderKind::Group, None) => Box::new(OktaGroupEntityProvider::from_config(cfg)?),
        (ProviderKind::User, Some(dir)) => Box::new(OktaUserEntityProvider::new(dir, cfg)),
        (ProviderKind::User, None) => Box::new(OktaUserEntityProvider::from_config(cfg)?),
    };
    Ok(provider)
}

async fn load_fixture(path: &Path) -> Result<Arc<dyn DirectoryClient>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    let directory = StaticDirectory::from_json(&raw)
        .with_context(|| format!("Invalid directory fixture {}", path.display()))?;
    Ok(Arc::new(directory))
}

pub(crate) async fn sync_okta(args: SyncArgs) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    let fixture = match &args.fixture {
        Some(path) => Some(load_fixture(path).await?),
        None => None,
    };

    let batch: Batch = Arc::default();
    let mut providers = Vec::new();
    for cfg in config.okta_providers()? {
        let mut provider = build_provider(args.provider, cfg, fixture.clone())
            .with_context(|| format!("Invalid Okta provider for {}", cfg.org_url))?;
        let name = provider.provider_name();
        provider.connect(Arc::new(BatchSink {
            provider: name,
            batch: batch.clone(),
        }));
        providers.push(provider);
    }

    let Some(secs) = args.interval_secs else {
        return run_pass(&providers, &batch, args.out.as_deref()).await;
    };
    if secs == 0 {
        anyhow::bail!("--interval-secs must be positive");
    }

    log::info!(
        "Syncing {} provider(s) every {secs}s; Ctrl-C to stop",
        providers.len()
    );
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Stopping sync");
                return Ok(());
            }
        }
        if let Err(err) = run_pass(&providers, &batch, args.out.as_deref()).await {
            log::error!("Sync pass failed: {err:#}");
        }
    }
}

/// Runs every provider once and writes what they produced. Providers that
/// fail are logged and counted; the others still get written.
async fn run_pass(
    providers: &[Box<dyn EntityProvider>],
    batch: &Batch,
    out: Option<&Path>,
) -> Result<()> {
    let mut failures = 0usize;
    for provider in providers {
        if let Err(err) = provider.run().await {
            failures += 1;
            log::error!("{} failed: {err}", provider.provider_name());
        }
    }

    let outputs = std::mem::take(
        &mut *batch
            .lock()
            .map_err(|_| anyhow!("output batch lock poisoned"))?,
    );
    let json = serialize_json_pretty(&outputs)?;
    match out {
        Some(path) => tokio::fs::write(path, format!("{json}\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print_stdout(&json)?,
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} provider(s) failed", providers.len());
    }
    Ok(())
}
