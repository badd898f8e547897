use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::DirectoryError;

/// Free-form directory profile. Okta profiles carry custom attributes, so
/// values are kept as raw JSON and interpreted by the caller.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Profile(BTreeMap<String, Value>);

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get_str("email")
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("displayName")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Profile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DirectoryGroup {
    pub id: String,
    #[serde(default)]
    pub profile: Profile,
}

impl DirectoryGroup {
    pub fn new(id: impl Into<String>, profile: Profile) -> Self {
        Self {
            id: id.into(),
            profile,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DirectoryUser {
    pub id: String,
    #[serde(default)]
    pub profile: Profile,
}

impl DirectoryUser {
    pub fn new(id: impl Into<String>, profile: Profile) -> Self {
        Self {
            id: id.into(),
            profile,
        }
    }

    /// A user with only an email in its profile.
    pub fn with_email(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(id, Profile::new().with("email", email.into()))
    }
}

/// Read-only view of an organizational directory.
///
/// Listings are finite and not restartable: calling a method again re-queries
/// the directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_groups(
        &self,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<DirectoryGroup>, DirectoryError>;

    async fn list_group_members(
        &self,
        group_id: &str,
    ) -> std::result::Result<Vec<DirectoryUser>, DirectoryError>;

    async fn list_users(
        &self,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<DirectoryUser>, DirectoryError>;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SnapshotGroup {
    #[serde(flatten)]
    pub group: DirectoryGroup,
    #[serde(default)]
    pub members: Vec<DirectoryUser>,
}

/// A directory captured as JSON: `{ "groups": [{ id, profile, members }], "users": [...] }`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub groups: Vec<SnapshotGroup>,
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
}

/// Serves a fixed snapshot. Search filters are Okta expressions and cannot be
/// evaluated offline, so they are ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    snapshot: DirectorySnapshot,
}

impl StaticDirectory {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw).map(Self::new)
    }

    #[must_use]
    pub fn with_group(mut self, group: DirectoryGroup, members: Vec<DirectoryUser>) -> Self {
        self.snapshot.groups.push(SnapshotGroup { group, members });
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: DirectoryUser) -> Self {
        self.snapshot.users.push(user);
        self
    }
}

#[async_trait]
impl DirectoryClient for StaticDirectory {
    async fn list_groups(
        &self,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<DirectoryGroup>, DirectoryError> {
        if let Some(filter) = filter {
            log::debug!("static directory ignores group filter {filter:?}");
        }
        Ok(self
            .snapshot
            .groups
            .iter()
            .map(|entry| entry.group.clone())
            .collect())
    }

    async fn list_group_members(
        &self,
        group_id: &str,
    ) -> std::result::Result<Vec<DirectoryUser>, DirectoryError> {
        // Okta group ids are unique; in a hand-written snapshot the first match wins.
        self.snapshot
            .groups
            .iter()
            .find(|entry| entry.group.id == group_id)
            .map(|entry| entry.members.clone())
            .ok_or_else(|| DirectoryError::UnknownGroup(group_id.to_string()))
    }

    async fn list_users(
        &self,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<DirectoryUser>, DirectoryError> {
        if let Some(filter) = filter {
            log::debug!("static directory ignores user filter {filter:?}");
        }
        Ok(self.snapshot.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_accessors_ignore_non_string_values() {
        let profile = Profile::new()
            .with("name", "Everyone@co")
            .with("description", Value::Null)
            .with("org_id", 1234);
        assert_eq!(profile.name(), Some("Everyone@co"));
        assert_eq!(profile.description(), None);
        assert_eq!(profile.get_str("org_id"), None);
        assert_eq!(profile.get("org_id"), Some(&json!(1234)));
    }

    #[test]
    fn okta_group_payload_deserializes_with_extra_fields() {
        let raw = json!({
            "id": "00g1",
            "type": "OKTA_GROUP",
            "profile": { "name": "Engineering", "description": null },
            "_links": {}
        });
        let group: DirectoryGroup = serde_json::from_value(raw).unwrap();
        assert_eq!(group.id, "00g1");
        assert_eq!(group.profile.name(), Some("Engineering"));
    }

    #[tokio::test]
    async fn static_directory_serves_snapshot_in_order() {
        let directory = StaticDirectory::from_json(
            r#"{
                "groups": [
                    { "id": "g1", "profile": { "name": "One" }, "members": [
                        { "id": "u1", "profile": { "email": "a@co.com" } },
                        { "id": "u2", "profile": { "email": "b@co.com" } }
                    ] },
                    { "id": "g2", "profile": { "name": "Two" } }
                ],
                "users": [ { "id": "u1", "profile": { "email": "a@co.com" } } ]
            }"#,
        )
        .unwrap();

        let groups = directory.list_groups(Some("ignored")).await.unwrap();
        assert_eq!(
            groups.iter().map(|g| g.id.as_str()).collect::<Vec<_>>(),
            ["g1", "g2"]
        );
        let members = directory.list_group_members("g1").await.unwrap();
        assert_eq!(
            members.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            ["u1", "u2"]
        );
        assert!(directory.list_group_members("g2").await.unwrap().is_empty());
        assert!(matches!(
            directory.list_group_members("missing").await,
            Err(DirectoryError::UnknownGroup(_))
        ));
        assert_eq!(directory.list_users(None).await.unwrap().len(), 1);
    }
}
