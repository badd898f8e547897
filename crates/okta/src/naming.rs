use catalog_model::validate_entity_name;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::directory::{DirectoryGroup, DirectoryUser, Profile};
use crate::error::{ConfigError, NamingError};
use crate::kebab::kebab_case;

type GroupNameFn = dyn Fn(&DirectoryGroup) -> Result<String, NamingError> + Send + Sync;
type UserNameFn = dyn Fn(&DirectoryUser) -> Result<String, NamingError> + Send + Sync;

const GROUP_STRATEGIES: &str = "id, kebab-case-name, { profile_field = \"...\" }";
const USER_STRATEGIES: &str = "id, kebab-case-email, strip-domain-email";

/// How a directory group becomes a catalog entity name.
#[derive(Clone, Default)]
pub enum GroupNamingStrategy {
    #[default]
    Id,
    KebabCaseName,
    ProfileField(String),
    Custom(Arc<GroupNameFn>),
}

impl GroupNamingStrategy {
    pub fn custom(
        f: impl Fn(&DirectoryGroup) -> Result<String, NamingError> + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn profile_field(field: impl Into<String>) -> Self {
        Self::ProfileField(field.into())
    }

    /// Computes the entity name. Every variant, custom ones included, must
    /// produce a valid (non-empty) name or the group is skipped.
    pub fn name_for(&self, group: &DirectoryGroup) -> Result<String, NamingError> {
        let name = match self {
            Self::Id => group.id.clone(),
            Self::KebabCaseName => kebab_case(required_str(&group.profile, "name")?),
            Self::ProfileField(field) => scalar_field(&group.profile, field)?,
            Self::Custom(f) => f(group)?,
        };
        validate_entity_name(&name)?;
        Ok(name)
    }
}

impl fmt::Debug for GroupNamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("Id"),
            Self::KebabCaseName => f.write_str("KebabCaseName"),
            Self::ProfileField(field) => f.debug_tuple("ProfileField").field(field).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for GroupNamingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(Self::Id),
            "kebab-case-name" => Ok(Self::KebabCaseName),
            other => match other.strip_prefix("profile-field:") {
                Some(field) if !field.trim().is_empty() => {
                    Ok(Self::ProfileField(field.trim().to_string()))
                }
                _ => Err(ConfigError::UnknownStrategy {
                    kind: "group",
                    value: other.to_string(),
                    expected: GROUP_STRATEGIES,
                }),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupNamingStrategy {
    Named(String),
    Field { profile_field: String },
}

impl<'de> Deserialize<'de> for GroupNamingStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawGroupNamingStrategy::deserialize(deserializer)? {
            RawGroupNamingStrategy::Named(name) => name.parse().map_err(serde::de::Error::custom),
            RawGroupNamingStrategy::Field { profile_field } => {
                if profile_field.trim().is_empty() {
                    return Err(serde::de::Error::custom(
                        "profile_field naming strategy needs a field name",
                    ));
                }
                Ok(Self::ProfileField(profile_field))
            }
        }
    }
}

/// How a directory user becomes a catalog entity name (and group member ref).
#[derive(Clone, Default)]
pub enum UserNamingStrategy {
    #[default]
    Id,
    KebabCaseEmail,
    StripDomainEmail,
    Custom(Arc<UserNameFn>),
}

impl UserNamingStrategy {
    pub fn custom(
        f: impl Fn(&DirectoryUser) -> Result<String, NamingError> + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn name_for(&self, user: &DirectoryUser) -> Result<String, NamingError> {
        let name = match self {
            Self::Id => user.id.clone(),
            Self::KebabCaseEmail => kebab_case(required_str(&user.profile, "email")?),
            Self::StripDomainEmail => {
                let email = required_str(&user.profile, "email")?;
                email.split('@').next().unwrap_or_default().to_string()
            }
            Self::Custom(f) => f(user)?,
        };
        validate_entity_name(&name)?;
        Ok(name)
    }
}

impl fmt::Debug for UserNamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("Id"),
            Self::KebabCaseEmail => f.write_str("KebabCaseEmail"),
            Self::StripDomainEmail => f.write_str("StripDomainEmail"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for UserNamingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(Self::Id),
            "kebab-case-email" => Ok(Self::KebabCaseEmail),
            "strip-domain-email" => Ok(Self::StripDomainEmail),
            other => Err(ConfigError::UnknownStrategy {
                kind: "user",
                value: other.to_string(),
                expected: USER_STRATEGIES,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for UserNamingStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

fn required_str<'a>(profile: &'a Profile, field: &str) -> Result<&'a str, NamingError> {
    match profile.get(field) {
        None | Some(Value::Null) => Err(NamingError::MissingField {
            field: field.to_string(),
        }),
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(NamingError::InvalidFieldType {
            field: field.to_string(),
            found: json_type_name(other),
        }),
    }
}

fn scalar_field(profile: &Profile, field: &str) -> Result<String, NamingError> {
    match profile.get(field) {
        Some(Value::Number(number)) => Ok(number_to_string(number)),
        _ => required_str(profile, field).map(str::to_string),
    }
}

/// Decimal form of a profile number. Integral floats below 1e21 print without
/// a fraction or exponent, and `-0` prints as `0`.
pub(crate) fn number_to_string(number: &serde_json::Number) -> String {
    if let Some(float) = number.as_f64().filter(|_| number.is_f64()) {
        if float == 0.0 {
            return "0".to_string();
        }
        if float.fract() == 0.0 && float.abs() < 1e21 {
            return format!("{float:.0}");
        }
    }
    number.to_string()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
