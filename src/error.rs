// Error taxonomy for reference resolution
//
// Structural errors (duplicate keys, malformed dicts, rejected references)
// surface eagerly at the call that caused them. Lookup errors surface lazily,
// on the first resolve() of a proxy.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// Two resolvers registered with the same type key
    #[error("a resolver for type key '{0}' is already registered")]
    DuplicateTypeKey(String),

    /// Reference dict is not a single `{type_key: id}` entry
    #[error("malformed reference dict: {0}")]
    MalformedReference(String),

    /// No resolver matches the entity or type key
    #[error("no resolver registered for {0}")]
    UnregisteredType(String),

    /// The field's check function rejected the value
    #[error("invalid reference for '{field}': {reference}")]
    InvalidReference { field: String, reference: String },

    /// The resolver found nothing for a well-formed reference
    #[error("entity not found: {{\"{type_key}\": \"{id}\"}}")]
    EntityNotFound { type_key: String, id: String },

    /// The storage collaborator failed while fetching
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ReferenceError>;

impl ReferenceError {
    pub fn not_found(type_key: &str, id: &str) -> Self {
        ReferenceError::EntityNotFound {
            type_key: type_key.to_string(),
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ReferenceError::DuplicateTypeKey("user".to_string());
        assert_eq!(err.to_string(), "a resolver for type key 'user' is already registered");

        let err = ReferenceError::not_found("group", "7");
        assert_eq!(err.to_string(), "entity not found: {\"group\": \"7\"}");

        let err = ReferenceError::InvalidReference {
            field: "receiver".to_string(),
            reference: "null".to_string(),
        };
        assert_eq!(err.to_string(), "invalid reference for 'receiver': null");
    }
}
