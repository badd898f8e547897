use serde::Deserialize;
use url::Url;

use crate::error::ArgoError;

pub const DEFAULT_USERNAME: &str = "argocdUsername";
pub const DEFAULT_PASSWORD: &str = "argocdPassword";

const CONFIG_LOCATOR: &str = "config";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ArgoInstance {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ArgoInstance {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            token: None,
            username: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// A configured token, if it is non-blank.
    #[must_use]
    pub fn static_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppLocatorMethod {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub instances: Vec<ArgoInstance>,
}

/// The `[argocd]` config section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ArgoConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub app_locator_methods: Vec<AppLocatorMethod>,
}

impl ArgoConfig {
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }

    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or(DEFAULT_PASSWORD)
    }

    /// Instances from every `type = "config"` locator, in declaration order.
    #[must_use]
    pub fn instances(&self) -> Vec<ArgoInstance> {
        self.app_locator_methods
            .iter()
            .filter(|method| method.kind == CONFIG_LOCATOR)
            .flat_map(|method| method.instances.iter().cloned())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ArgoError> {
        for instance in self.instances() {
            if instance.name.trim().is_empty() {
                return Err(ArgoError::Config(format!(
                    "instance with url {:?} has an empty name",
                    instance.url
                )));
            }
            Url::parse(&instance.url).map_err(|err| {
                ArgoError::Config(format!(
                    "instance {} has an invalid url {:?}: {err}",
                    instance.name, instance.url
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
        username = "admin"

        [[app_locator_methods]]
        type = "config"
        [[app_locator_methods.instances]]
        name = "argoInstance1"
        url = "https://argo1.example.com"
        token = "static"
        [[app_locator_methods.instances]]
        name = "argoInstance2"
        url = "https://argo2.example.com"
        username = "ops"
        password = "hunter2"

        [[app_locator_methods]]
        type = "cluster"
        [[app_locator_methods.instances]]
        name = "ignored"
        url = "https://ignored.example.com"
    "#;

    #[test]
    fn flattens_config_locators_only() {
        let cfg: ArgoConfig = toml::from_str(SAMPLE).unwrap();
        cfg.validate().unwrap();

        let names: Vec<String> = cfg.instances().into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["argoInstance1", "argoInstance2"]);
        assert_eq!(cfg.instances()[0].static_token(), Some("static"));
        assert_eq!(cfg.instances()[1].username.as_deref(), Some("ops"));
    }

    #[test]
    fn global_credentials_fall_back_to_defaults() {
        let cfg: ArgoConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.username(), "admin");
        assert_eq!(cfg.password(), DEFAULT_PASSWORD);

        let empty = ArgoConfig::default();
        assert_eq!(empty.username(), DEFAULT_USERNAME);
        assert!(empty.instances().is_empty());
    }

    #[test]
    fn rejects_invalid_instance_urls() {
        let cfg = ArgoConfig {
            app_locator_methods: vec![AppLocatorMethod {
                kind: "config".to_string(),
                instances: vec![ArgoInstance::new("a", "not a url")],
            }],
            ..ArgoConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ArgoError::Config(_))));
    }

    #[test]
    fn blank_token_is_not_a_static_token() {
        let instance = ArgoInstance::new("a", "https://a").with_token("  ");
        assert_eq!(instance.static_token(), None);
    }
}
