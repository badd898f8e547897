use catalog_model::{
    EntityMetadata, GroupEntity, UserEntity, UserProfile, ANNOTATION_LOCATION,
    ANNOTATION_ORIGIN_LOCATION,
};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::directory::{DirectoryGroup, DirectoryUser};
use crate::error::NamingError;
use crate::naming::{number_to_string, GroupNamingStrategy, UserNamingStrategy};

#[derive(Debug, Clone, Default)]
pub struct MappingOptions {
    pub group_naming: GroupNamingStrategy,
    pub user_naming: UserNamingStrategy,
    pub parent_group_field: Option<String>,
    pub include_empty_groups: bool,
    pub annotations: BTreeMap<String, String>,
}

/// Location annotations stamped on every entity synced from `org_url`.
pub fn default_annotations(org_url: &str) -> BTreeMap<String, String> {
    let location = format!("url:{org_url}");
    BTreeMap::from([
        (ANNOTATION_LOCATION.to_string(), location.clone()),
        (ANNOTATION_ORIGIN_LOCATION.to_string(), location),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: NamingError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupMapping {
    Emitted(GroupEntity),
    /// No resolvable members and empty groups are not wanted.
    Empty,
    Skipped(NamingError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedGroup {
    pub group_id: String,
    pub mapping: GroupMapping,
    pub skipped_members: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingOutcome {
    pub entities: Vec<GroupEntity>,
    pub empty_groups: Vec<String>,
    pub skipped_groups: Vec<SkippedRecord>,
    pub skipped_members: Vec<SkippedRecord>,
}

impl MappingOutcome {
    pub fn absorb(&mut self, mapped: MappedGroup) {
        self.skipped_members.extend(mapped.skipped_members);
        match mapped.mapping {
            GroupMapping::Emitted(entity) => self.entities.push(entity),
            GroupMapping::Empty => self.empty_groups.push(mapped.group_id),
            GroupMapping::Skipped(reason) => self.skipped_groups.push(SkippedRecord {
                id: mapped.group_id,
                reason,
            }),
        }
    }
}

/// Maps a whole directory snapshot to group entities.
///
/// Pure: the same snapshot and options always produce the same outcome.
pub fn build_group_entities<I>(groups: I, options: &MappingOptions) -> MappingOutcome
where
    I: IntoIterator<Item = (DirectoryGroup, Vec<DirectoryUser>)>,
{
    let mut outcome = MappingOutcome::default();
    for (group, members) in groups {
        outcome.absorb(map_group(&group, &members, options));
    }
    outcome
}

/// Maps one group and its members.
///
/// A member that cannot be named is dropped from `members`; a group that
/// cannot be named is dropped entirely.
pub fn map_group(
    group: &DirectoryGroup,
    members: &[DirectoryUser],
    options: &MappingOptions,
) -> MappedGroup {
    let mut names = Vec::with_capacity(members.len());
    let mut skipped_members = Vec::new();
    for member in members {
        match options.user_naming.name_for(member) {
            Ok(name) => names.push(name),
            Err(reason) => {
                log::warn!(
                    "Skipping member {} of group {}: {reason}",
                    member.id,
                    group.id
                );
                skipped_members.push(SkippedRecord {
                    id: member.id.clone(),
                    reason,
                });
            }
        }
    }

    let mapping = if names.is_empty() && !options.include_empty_groups {
        log::debug!("Group {} has no members, not emitting it", group.id);
        GroupMapping::Empty
    } else {
        match options.group_naming.name_for(group) {
            Ok(name) => GroupMapping::Emitted(group_entity(group, name, names, options)),
            Err(reason) => {
                log::warn!("Skipping group {}: {reason}", group.id);
                GroupMapping::Skipped(reason)
            }
        }
    };

    MappedGroup {
        group_id: group.id.clone(),
        mapping,
        skipped_members,
    }
}

fn group_entity(
    group: &DirectoryGroup,
    name: String,
    members: Vec<String>,
    options: &MappingOptions,
) -> GroupEntity {
    let metadata = EntityMetadata {
        name,
        title: group.profile.name().map(str::to_string),
        description: Some(group.profile.description().unwrap_or_default().to_string()),
        annotations: options.annotations.clone(),
    };
    let mut entity = GroupEntity::new(metadata, members);
    entity.spec.parent = options
        .parent_group_field
        .as_deref()
        .and_then(|field| parent_ref(group.profile.get(field)));
    entity
}

/// Strings pass through and numbers become decimal strings. Everything else,
/// and the empty string, means "no parent".
fn parent_ref(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(parent) if !parent.is_empty() => Some(parent.clone()),
        Value::Number(number) => Some(number_to_string(number)),
        _ => None,
    }
}

pub fn map_user(
    user: &DirectoryUser,
    naming: &UserNamingStrategy,
    annotations: &BTreeMap<String, String>,
) -> Result<UserEntity, NamingError> {
    let name = naming.name_for(user)?;
    let email = user.profile.email().map(str::to_string);
    let metadata = EntityMetadata {
        name,
        title: email.clone(),
        description: None,
        annotations: annotations.clone(),
    };
    Ok(UserEntity::new(
        metadata,
        UserProfile {
            display_name: user.profile.display_name().map(str::to_string),
            email,
        },
    ))
}
