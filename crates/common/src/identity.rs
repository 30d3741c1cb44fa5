//! Persisted record types.
//!
//! ```text
//! <private>/services/<origin>/info.json          ServiceInfo
//! <private>/services/<origin>/uids/<uid>.json    Identity
//! <private>/services/<origin>/foreign_map.json   [ForeignMapping]
//! ```
//!
//! Every record keeps members it does not know about, since the extension owns
//! the schema and the daemon only interprets what it needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata for one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub origin: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceInfo {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            extra: Map::new(),
        }
    }
}

/// Declared type and recipients of one disclosable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub shared_with: Vec<String>,
}

/// Where a field sits in its sharing lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingState {
    /// Nobody but the owner can decrypt the value
    Private,
    /// The value is encrypted for these users, in order
    Shared(Vec<String>),
}

impl FieldMeta {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            shared_with: Vec::new(),
        }
    }

    pub fn is_shared_with(&self, username: &str) -> bool {
        self.shared_with.iter().any(|u| u == username)
    }

    pub fn state(&self, owner: &str) -> SharingState {
        if self.shared_with.iter().all(|u| u == owner) {
            SharingState::Private
        } else {
            SharingState::Shared(self.shared_with.clone())
        }
    }
}

/// One person entry under a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldMeta>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Some(BTreeMap::new()),
            extra: Map::new(),
        }
    }

    /// Builder-style helper to declare a field
    pub fn with_field(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), FieldMeta::new(kind));
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.as_ref().and_then(|fields| fields.get(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldMeta> {
        self.fields.as_mut().and_then(|fields| fields.get_mut(name))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .flat_map(|fields| fields.keys().map(String::as_str))
    }
}

/// An identity together with every field value the caller can decrypt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    #[serde(flatten)]
    pub identity: Identity,
    pub map: BTreeMap<String, String>,
}

/// "field_name of uid, contributed by username, also resolves under this origin".
///
/// Members default to empty so that a damaged entry still parses and can be
/// dropped by [`ForeignMapping::is_well_formed`] instead of poisoning the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignMapping {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub field_name: String,
}

impl ForeignMapping {
    pub fn new(
        username: impl Into<String>,
        uid: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            uid: uid.into(),
            field_name: field_name.into(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.username.is_empty() && !self.uid.is_empty() && !self.field_name.is_empty()
    }

    pub fn matches(&self, uid: &str, field_name: &str, username: &str) -> bool {
        self.uid == uid && self.field_name == field_name && self.username == username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parses_extension_format() {
        let raw = r#"{
            "key": "MIIC...",
            "fields": {
                "first_name": {"shared_with": ["malte"], "type": "str"},
                "email": {"shared_with": [], "type": "str"}
            },
            "label": "work"
        }"#;
        let identity: Identity = serde_json::from_str(raw).unwrap();

        assert_eq!(identity.key, "MIIC...");
        assert_eq!(
            identity.field("first_name").unwrap().shared_with,
            vec!["malte".to_string()]
        );
        assert_eq!(identity.field("email").unwrap().kind, "str");
        assert_eq!(identity.extra.get("label"), Some(&Value::from("work")));

        let back = serde_json::to_value(&identity).unwrap();
        assert_eq!(back["label"], "work");
        assert_eq!(back["fields"]["first_name"]["type"], "str");
    }

    #[test]
    fn test_identity_without_fields() {
        let identity: Identity = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert!(identity.fields.is_none());
        assert_eq!(identity.field_names().count(), 0);
    }

    #[test]
    fn test_sharing_state() {
        let mut meta = FieldMeta::new("str");
        assert_eq!(meta.state("irvin"), SharingState::Private);

        meta.shared_with.push("irvin".into());
        assert_eq!(meta.state("irvin"), SharingState::Private);

        meta.shared_with.push("malte".into());
        assert_eq!(
            meta.state("irvin"),
            SharingState::Shared(vec!["irvin".into(), "malte".into()])
        );
        assert!(meta.is_shared_with("malte"));
        assert!(!meta.is_shared_with("bob"));
    }

    #[test]
    fn test_malformed_foreign_mapping_still_parses() {
        let raw = r#"[
            {"username": "brandontjs", "uid": "1", "field_name": "first_name"},
            {"uid": "2", "field_name": "email"},
            {"username": "", "uid": "3", "field_name": "email"}
        ]"#;
        let map: Vec<ForeignMapping> = serde_json::from_str(raw).unwrap();
        let well_formed: Vec<_> = map.iter().filter(|m| m.is_well_formed()).collect();
        assert_eq!(well_formed.len(), 1);
        assert!(well_formed[0].matches("1", "first_name", "brandontjs"));
    }

    #[test]
    fn test_service_info_keeps_extra_members() {
        let info: ServiceInfo =
            serde_json::from_str(r#"{"origin": "http://a.com:80", "name": "A"}"#).unwrap();
        assert_eq!(info.origin, "http://a.com:80");
        assert_eq!(info.extra["name"], "A");
    }
}
