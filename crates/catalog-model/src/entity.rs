use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const API_VERSION: &str = "backstage.io/v1alpha1";
pub const GROUP_TYPE: &str = "group";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct GroupSpec {
    #[serde(rename = "type")]
    pub group_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntity {
    pub api_version: String,
    pub metadata: EntityMetadata,
    pub spec: GroupSpec,
}

impl GroupEntity {
    /// A fresh group: `type: group`, no children, no parent.
    pub fn new(metadata: EntityMetadata, members: Vec<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            metadata,
            spec: GroupSpec {
                group_type: GROUP_TYPE.to_string(),
                parent: None,
                children: Vec::new(),
                members,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub member_of: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub api_version: String,
    pub metadata: EntityMetadata,
    pub spec: UserSpec,
}

impl UserEntity {
    pub fn new(metadata: EntityMetadata, profile: UserProfile) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            metadata,
            spec: UserSpec {
                profile,
                member_of: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(tag = "kind")]
pub enum Entity {
    Group(GroupEntity),
    User(UserEntity),
}

impl Entity {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Group(_) => "Group",
            Self::User(_) => "User",
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &EntityMetadata {
        match self {
            Self::Group(group) => &group.metadata,
            Self::User(user) => &user.metadata,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&GroupEntity> {
        match self {
            Self::Group(group) => Some(group),
            Self::User(_) => None,
        }
    }

    #[must_use]
    pub fn as_user(&self) -> Option<&UserEntity> {
        match self {
            Self::User(user) => Some(user),
            Self::Group(_) => None,
        }
    }
}

impl From<GroupEntity> for Entity {
    fn from(value: GroupEntity) -> Self {
        Self::Group(value)
    }
}

impl From<UserEntity> for Entity {
    fn from(value: UserEntity) -> Self {
        Self::User(value)
    }
}

/// An entity tagged with the key of the provider that owns it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeferredEntity {
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_key: Option<String>,
}

impl DeferredEntity {
    pub fn new(entity: impl Into<Entity>, location_key: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            location_key: Some(location_key.into()),
        }
    }
}

/// Replaces every entity previously emitted under the same location key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityMutation {
    Full { entities: Vec<DeferredEntity> },
}

impl EntityMutation {
    pub fn full(entities: Vec<DeferredEntity>) -> Self {
        Self::Full { entities }
    }

    #[must_use]
    pub fn entities(&self) -> &[DeferredEntity] {
        match self {
            Self::Full { entities } => entities,
        }
    }
}
