use thiserror::Error;

pub const MAX_ENTITY_NAME_LEN: usize = 63;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityNameError {
    #[error("entity name must be non-empty")]
    Empty,

    #[error("entity name {name:?} exceeds {max} characters")]
    TooLong { name: String, max: usize },
}

/// Rejects names the catalog can never accept. Character-set policy is left
/// to the catalog itself.
pub fn validate_entity_name(name: &str) -> Result<(), EntityNameError> {
    if name.trim().is_empty() {
        return Err(EntityNameError::Empty);
    }
    if name.chars().count() > MAX_ENTITY_NAME_LEN {
        return Err(EntityNameError::TooLong {
            name: name.to_string(),
            max: MAX_ENTITY_NAME_LEN,
        });
    }
    Ok(())
}
