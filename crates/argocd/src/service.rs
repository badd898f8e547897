use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::config::{ArgoConfig, ArgoInstance};
use crate::error::{ArgoError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What to look up: a single application, or every application matching a
/// label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSelector {
    Name(String),
    Selector(String),
}

impl fmt::Display for AppSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "app {name}"),
            Self::Selector(selector) => write!(f, "apps with selector {selector}"),
        }
    }
}

/// One instance that knows about the requested application(s).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FoundApp {
    pub name: String,
    pub url: String,
    pub app_name: Vec<String>,
}

#[derive(Deserialize)]
struct SessionResponse {
    #[serde(default)]
    token: Option<String>,
}

pub struct ArgoService {
    http: Client,
    username: String,
    password: String,
    instances: Vec<ArgoInstance>,
}

impl ArgoService {
    pub fn new(config: &ArgoConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            username: config.username().to_string(),
            password: config.password().to_string(),
            instances: config.instances(),
        })
    }

    #[must_use]
    pub fn instances(&self) -> &[ArgoInstance] {
        &self.instances
    }

    /// First configured instance with this name.
    #[must_use]
    pub fn find_instance(&self, name: &str) -> Option<&ArgoInstance> {
        self.instances.iter().find(|instance| instance.name == name)
    }

    /// Logs in with the instance's own credentials, else the global ones.
    pub async fn get_argo_token(&self, instance: &ArgoInstance) -> Result<String> {
        let url = api_url(&instance.url, &["session"])?;
        let username = instance.username.as_deref().unwrap_or(&self.username);
        let password = instance.password.as_deref().unwrap_or(&self.password);

        log::debug!("Logging in to {} as {username}", instance.name);
        let response = self
            .http
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArgoError::Login {
                instance: instance.name.clone(),
                status: status.as_u16(),
            });
        }

        let session: SessionResponse = response.json().await?;
        session
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ArgoError::MissingToken {
                instance: instance.name.clone(),
            })
    }

    /// The static token when one is configured, otherwise a fresh login.
    pub async fn token_for(&self, instance: &ArgoInstance) -> Result<String> {
        match instance.static_token() {
            Some(token) => Ok(token.to_string()),
            None => self.get_argo_token(instance).await,
        }
    }

    /// Raw upstream body for the lookup, untouched.
    pub async fn get_argo_app_data(
        &self,
        base_url: &str,
        instance_name: &str,
        selector: &AppSelector,
        token: &str,
    ) -> Result<Vec<u8>> {
        let url = match selector {
            AppSelector::Name(name) => api_url(base_url, &["applications", name.as_str()])?,
            AppSelector::Selector(selector) => {
                let mut url = api_url(base_url, &["applications"])?;
                url.query_pairs_mut().append_pair("selector", selector);
                url
            }
        };

        log::debug!("Fetching {selector} from {instance_name}");
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArgoError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Resolves `instance_name`, authenticates and fetches.
    pub async fn lookup(&self, instance_name: &str, selector: &AppSelector) -> Result<Vec<u8>> {
        let instance = self
            .find_instance(instance_name)
            .ok_or_else(|| ArgoError::InstanceNotFound(instance_name.to_string()))?;
        let token = self.token_for(instance).await?;
        self.get_argo_app_data(&instance.url, &instance.name, selector, &token)
            .await
    }

    /// Asks every instance in turn. Instances that fail to authenticate or
    /// answer are left out rather than failing the whole search.
    pub async fn find_argo_app(&self, selector: &AppSelector) -> Vec<FoundApp> {
        let mut found = Vec::new();
        for instance in &self.instances {
            match self.find_on_instance(instance, selector).await {
                Ok(Some(app)) => found.push(app),
                Ok(None) => {}
                Err(err) => log::warn!("Skipping {} while finding {selector}: {err}", instance.name),
            }
        }
        found
    }

    async fn find_on_instance(
        &self,
        instance: &ArgoInstance,
        selector: &AppSelector,
    ) -> Result<Option<FoundApp>> {
        let token = self.token_for(instance).await?;
        let body = self
            .get_argo_app_data(&instance.url, &instance.name, selector, &token)
            .await?;

        let app_name = match selector {
            AppSelector::Name(name) => vec![name.clone()],
            AppSelector::Selector(_) => {
                let data: Value = serde_json::from_slice(&body)?;
                let Some(items) = data.get("items").and_then(Value::as_array) else {
                    return Ok(None);
                };
                items
                    .iter()
                    .filter_map(|item| item.pointer("/metadata/name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            }
        };

        Ok(Some(FoundApp {
            name: instance.name.clone(),
            url: instance.url.clone(),
            app_name,
        }))
    }
}

/// `{base}/api/v1/{segments..}`, keeping any path prefix on `base` and
/// percent-encoding each segment.
fn api_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["api", "v1"])
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_appends_and_encodes_segments() {
        let url = api_url("https://argo.example.com", &["applications", "my app"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://argo.example.com/api/v1/applications/my%20app"
        );

        let prefixed = api_url("https://example.com/argo/", &["session"]).unwrap();
        assert_eq!(prefixed.as_str(), "https://example.com/argo/api/v1/session");
    }

    #[test]
    fn found_app_serializes_camel_case() {
        let app = FoundApp {
            name: "argoInstance1".to_string(),
            url: "https://argo".to_string(),
            app_name: vec!["guestbook".to_string()],
        };
        assert_eq!(
            serde_json::to_value(app).unwrap(),
            json!({ "name": "argoInstance1", "url": "https://argo", "appName": ["guestbook"] })
        );
    }
}
