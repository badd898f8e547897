use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::mapper::{default_annotations, MappingOptions};
use crate::naming::{GroupNamingStrategy, UserNamingStrategy};

/// One Okta org, as listed under `[[catalog.providers.okta]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct OktaProviderConfig {
    pub org_url: String,
    /// API token; only required when talking to a live org.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub group_filter: Option<String>,
    #[serde(default)]
    pub user_filter: Option<String>,
    #[serde(default)]
    pub group_naming_strategy: Option<GroupNamingStrategy>,
    #[serde(default)]
    pub user_naming_strategy: Option<UserNamingStrategy>,
    #[serde(default)]
    pub parent_group_field: Option<String>,
    #[serde(default)]
    pub include_empty_groups: bool,
}

impl OktaProviderConfig {
    pub fn new(org_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            org_url: org_url.into(),
            token: token.into(),
            group_filter: None,
            user_filter: None,
            group_naming_strategy: None,
            user_naming_strategy: None,
            parent_group_field: None,
            include_empty_groups: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.org_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "org_url" });
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "token" });
        }
        Url::parse(self.org_url.trim())?;
        Ok(())
    }

    #[must_use]
    pub fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            group_naming: self.group_naming_strategy.clone().unwrap_or_default(),
            user_naming: self.user_naming_strategy.clone().unwrap_or_default(),
            parent_group_field: self
                .parent_group_field
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            include_empty_groups: self.include_empty_groups,
            annotations: default_annotations(self.org_url.trim()),
        }
    }
}
