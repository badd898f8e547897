use anyhow::{Context as AnyhowContext, Result};
use argocd_proxy::ArgoConfig;
use catalog_okta::OktaProviderConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const CONFIG_ENV: &str = "CATALOG_BRIDGE_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AppConfig {
    #[serde(default)]
    pub(crate) argocd: Option<ArgoConfig>,
    #[serde(default)]
    pub(crate) catalog: CatalogSection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogSection {
    #[serde(default)]
    pub(crate) providers: ProvidersSection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProvidersSection {
    #[serde(default)]
    pub(crate) okta: Vec<OktaProviderConfig>,
}

impl AppConfig {
    /// Loads from `--config`, falling back to `$CATALOG_BRIDGE_CONFIG`.
    pub(crate) fn load(flag: Option<&Path>) -> Result<Self> {
        let path = match flag {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .with_context(|| format!("No config file: pass --config or set {CONFIG_ENV}"))?,
        };
        Self::from_file(&path)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub(crate) fn argocd(&self) -> Result<&ArgoConfig> {
        self.argocd
            .as_ref()
            .context("Config has no [argocd] section")
    }

    pub(crate) fn okta_providers(&self) -> Result<&[OktaProviderConfig]> {
        let providers = &self.catalog.providers.okta;
        if providers.is_empty() {
            anyhow::bail!("Config has no [[catalog.providers.okta]] entries");
        }
        Ok(providers)
    }
}
