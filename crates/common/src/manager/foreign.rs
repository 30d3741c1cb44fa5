use std::collections::BTreeMap;

use super::locks::LockKey;
use super::{foreign_map_path, service_path, validate_username, Manager, ParanoidError};
use crate::identity::ForeignMapping;

/// Values resolved through a foreign map, `uid -> field_name -> plaintext`
pub type ResolvedForeignMap = BTreeMap<String, BTreeMap<String, String>>;

/// Drop entries missing a member, logging each one
fn well_formed(origin: &str, entries: Vec<ForeignMapping>) -> Vec<ForeignMapping> {
    entries
        .into_iter()
        .filter(|entry| {
            let keep = entry.is_well_formed();
            if !keep {
                tracing::warn!(origin, entry = ?entry, "dropping malformed foreign map entry");
            }
            keep
        })
        .collect()
}

impl Manager {
    /// The foreign map of `origin`, or `None` if it was never written.
    pub async fn get_foreign_map(
        &self,
        origin: &str,
    ) -> Result<Option<Vec<ForeignMapping>>, ParanoidError> {
        if let Some(entries) = self.cache.foreign_map(origin) {
            return Ok(Some(entries));
        }

        let path = foreign_map_path(origin)?;
        let Some(entries) = self.read_json::<Vec<ForeignMapping>>(&path).await? else {
            return Ok(None);
        };
        let entries = well_formed(origin, entries);

        self.cache.set_foreign_map(origin, entries.clone());
        Ok(Some(entries))
    }

    /// Replace the foreign map of `origin`.
    pub async fn set_foreign_map(
        &self,
        origin: &str,
        entries: Vec<ForeignMapping>,
    ) -> Result<(), ParanoidError> {
        let created = self.store.ensure_dir(&service_path(origin)?).await?;
        self.write_json(&foreign_map_path(origin)?, &entries).await?;
        if created {
            self.cache.add_origin(origin);
        }
        self.cache.set_foreign_map(origin, entries);
        Ok(())
    }

    pub async fn add_foreign_mapping(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        username: &str,
    ) -> Result<Vec<ForeignMapping>, ParanoidError> {
        validate_username(username)?;
        if uid.is_empty() {
            return Err(ParanoidError::InvalidUid(uid.to_string()));
        }
        if field_name.is_empty() {
            return Err(ParanoidError::InvalidField(field_name.to_string()));
        }
        let mapping = ForeignMapping::new(username, uid, field_name);

        let _guard = self.locks.lock(LockKey::foreign_map(origin)).await;
        let mut entries = self.get_foreign_map(origin).await?.unwrap_or_default();
        if entries.iter().any(|e| e.matches(uid, field_name, username)) {
            return Err(ParanoidError::MappingExists {
                uid: uid.to_string(),
                field_name: field_name.to_string(),
                username: username.to_string(),
            });
        }
        entries.push(mapping);

        self.set_foreign_map(origin, entries.clone()).await?;
        tracing::info!(origin, uid, field_name, username, "foreign mapping added");
        Ok(entries)
    }

    pub async fn remove_foreign_mapping(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        username: &str,
    ) -> Result<Vec<ForeignMapping>, ParanoidError> {
        let _guard = self.locks.lock(LockKey::foreign_map(origin)).await;
        let entries = self
            .get_foreign_map(origin)
            .await?
            .ok_or_else(|| ParanoidError::ForeignMapNotFound(origin.to_string()))?;

        let before = entries.len();
        let entries: Vec<ForeignMapping> = entries
            .into_iter()
            .filter(|e| !e.matches(uid, field_name, username))
            .collect();
        if entries.len() == before {
            return Err(ParanoidError::MappingNotFound {
                uid: uid.to_string(),
                field_name: field_name.to_string(),
                username: username.to_string(),
            });
        }

        self.set_foreign_map(origin, entries.clone()).await?;
        tracing::info!(origin, uid, field_name, username, "foreign mapping removed");
        Ok(entries)
    }

    /// Decrypt every field the foreign map of `origin` points at.
    ///
    /// Fields that are gone or no longer shared with us are left out.
    pub async fn resolve_foreign_map(
        &self,
        origin: &str,
    ) -> Result<ResolvedForeignMap, ParanoidError> {
        let mut resolved = ResolvedForeignMap::new();
        let Some(entries) = self.get_foreign_map(origin).await? else {
            return Ok(resolved);
        };

        for entry in entries {
            match self
                .decrypt_foreign_field(&entry.username, origin, &entry.uid, &entry.field_name)
                .await
            {
                Ok(Some(value)) => {
                    resolved
                        .entry(entry.uid)
                        .or_default()
                        .insert(entry.field_name, value);
                }
                Ok(None) => {
                    tracing::debug!(origin, entry = ?entry, "foreign field not readable");
                }
                Err(e) => {
                    tracing::debug!(origin, entry = ?entry, error = %e, "could not resolve foreign field");
                }
            }
        }

        Ok(resolved)
    }
}
