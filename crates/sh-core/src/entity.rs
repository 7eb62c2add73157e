//! Entity identity shared by every persisted domain object

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::NULL_REF;

/// Error type for invalid entity ids
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity id cannot be empty")]
    Empty,

    #[error("entity id '{0}' is reserved for absent references")]
    Reserved(String),

    #[error("entity id cannot start or end with whitespace")]
    SurroundingWhitespace,

    #[error("entity id cannot contain control characters")]
    ControlCharacters,
}

/// Common contract of every persisted domain object
///
/// Equality between entities of the same type is defined by id alone; the
/// implementing types carry a matching `PartialEq`.
pub trait Entity {
    /// Unique id within the entity type's file
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Creation timestamp
    fn created_at(&self) -> DateTime<Utc>;
}

/// Check that a string is usable as an entity id
///
/// Ids are written verbatim into record files and compared byte-for-byte on
/// reload, so they must be non-empty, trimmed, free of control characters and
/// distinct from the [`NULL_REF`] sentinel.
pub fn validate_entity_id(id: &str) -> Result<(), EntityIdError> {
    if id.is_empty() {
        return Err(EntityIdError::Empty);
    }
    if id == NULL_REF {
        return Err(EntityIdError::Reserved(id.to_string()));
    }
    if id.trim() != id {
        return Err(EntityIdError::SurroundingWhitespace);
    }
    if id.chars().any(char::is_control) {
        return Err(EntityIdError::ControlCharacters);
    }
    Ok(())
}

/// Convert epoch seconds into a UTC timestamp
pub fn timestamp_from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(validate_entity_id("D1").is_ok());
        assert!(validate_entity_id("living room").is_ok());
        assert!(validate_entity_id("a|b").is_ok());
    }

    #[test]
    fn test_invalid_ids() {
        assert_eq!(validate_entity_id(""), Err(EntityIdError::Empty));
        assert_eq!(
            validate_entity_id("NULL"),
            Err(EntityIdError::Reserved("NULL".to_string()))
        );
        assert_eq!(
            validate_entity_id(" R1"),
            Err(EntityIdError::SurroundingWhitespace)
        );
        assert_eq!(
            validate_entity_id("R\n1"),
            Err(EntityIdError::ControlCharacters)
        );
    }

    #[test]
    fn test_timestamp_from_epoch() {
        let ts = timestamp_from_epoch(1_700_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }
}
