use crate::origin::OriginError;
use crate::store::StoreError;

/// Everything a manager operation can fail with.
///
/// Absence is not an error: lookups return `None` or an empty list. What is
/// left are violated preconditions, which carry a message meant for the
/// caller, and failures of the store itself.
#[derive(Debug, thiserror::Error)]
pub enum ParanoidError {
    #[error("invalid origin: {0}")]
    InvalidOrigin(#[from] OriginError),
    #[error("invalid uid: {0:?}")]
    InvalidUid(String),
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),
    #[error("service does not exist for origin: {0}")]
    ServiceNotFound(String),
    #[error("service identity does not exist for {origin}:{uid}")]
    IdentityNotFound { origin: String, uid: String },
    #[error("service identity already exists for {origin}:{uid}")]
    IdentityExists { origin: String, uid: String },
    #[error("malformed service identity")]
    MalformedIdentity,
    #[error("\"{0}\" is not a valid field name for service identity")]
    InvalidField(String),
    #[error("could not locate data file for {origin}:{uid}:{field_name}")]
    FieldNotFound {
        origin: String,
        uid: String,
        field_name: String,
    },
    #[error("mapping already exists for ({uid}, {field_name}, {username})")]
    MappingExists {
        uid: String,
        field_name: String,
        username: String,
    },
    #[error("mapping does not exist for ({uid}, {field_name}, {username})")]
    MappingNotFound {
        uid: String,
        field_name: String,
        username: String,
    },
    #[error("foreign map does not exist for origin: {0}")]
    ForeignMapNotFound(String),
    #[error("\"{field_name}\" is already shared with {username}")]
    AlreadyShared { field_name: String, username: String },
    #[error("\"{field_name}\" is not shared with {username}")]
    NotShared { field_name: String, username: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ParanoidError {
    /// Whether the caller asked for something the current state forbids, as
    /// opposed to the store or encoding failing underneath
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            ParanoidError::Serialization(_) | ParanoidError::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ParanoidError::ServiceNotFound("http://a.com:80".into()).is_precondition());
        assert!(ParanoidError::MalformedIdentity.is_precondition());
        assert!(!ParanoidError::Store(StoreError::Backend(anyhow::anyhow!("boom")))
            .is_precondition());
    }

    #[test]
    fn test_messages() {
        let err = ParanoidError::InvalidField("phone".into());
        assert_eq!(
            err.to_string(),
            "\"phone\" is not a valid field name for service identity"
        );
        let err = ParanoidError::MappingExists {
            uid: "1".into(),
            field_name: "email".into(),
            username: "malte".into(),
        };
        assert_eq!(
            err.to_string(),
            "mapping already exists for (1, email, malte)"
        );
    }
}
