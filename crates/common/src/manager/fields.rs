use super::locks::LockKey;
use super::{field_path, validate_username, Manager, ParanoidError};
use crate::identity::Identity;

impl Manager {
    /// Check that `field_name` is declared on `identity`.
    pub fn validate_field_name(identity: &Identity, field_name: &str) -> Result<(), ParanoidError> {
        match identity.fields.as_ref() {
            Some(fields) if !fields.is_empty() => {
                if fields.contains_key(field_name) {
                    Ok(())
                } else {
                    Err(ParanoidError::InvalidField(field_name.to_string()))
                }
            }
            _ => Err(ParanoidError::MalformedIdentity),
        }
    }

    /// Plaintext of one of our own fields, if it exists and we can decrypt it.
    pub async fn decrypt_field(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
    ) -> Result<Option<String>, ParanoidError> {
        self.decrypt_field_in(None, origin, uid, field_name).await
    }

    /// Plaintext of a field held by `username`, if they shared it with us.
    pub async fn decrypt_foreign_field(
        &self,
        username: &str,
        origin: &str,
        uid: &str,
        field_name: &str,
    ) -> Result<Option<String>, ParanoidError> {
        validate_username(username)?;
        // Our own namespace is addressed without an owner
        let owner = (username != self.username()).then_some(username);
        self.decrypt_field_in(owner, origin, uid, field_name).await
    }

    async fn decrypt_field_in(
        &self,
        owner: Option<&str>,
        origin: &str,
        uid: &str,
        field_name: &str,
    ) -> Result<Option<String>, ParanoidError> {
        if let Some(value) = self.cache.field(owner, origin, uid, field_name) {
            return Ok(Some(value));
        }

        let path = field_path(owner, origin, uid, field_name);
        if !self.store.exists(&path).await? {
            return Ok(None);
        }
        let Some(bytes) = self.store.decrypt(&path).await? else {
            tracing::debug!(path = %path, "field did not decrypt");
            return Ok(None);
        };

        let value = match String::from_utf8(bytes) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(path = %path, "decrypted field is not valid utf-8");
                return Ok(None);
            }
        };

        self.cache
            .set_field(owner, origin, uid, field_name, value.clone());
        Ok(Some(value))
    }

    /// Encrypt `plaintext` for `shared_users` and replace the stored object.
    ///
    /// An empty recipient list means "only me".
    pub async fn encrypt_field(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        plaintext: &str,
        shared_users: &[String],
    ) -> Result<(), ParanoidError> {
        let path = field_path(None, origin, uid, field_name);
        let own;
        let recipients = if shared_users.is_empty() {
            own = [self.username().to_string()];
            &own[..]
        } else {
            shared_users
        };
        for recipient in recipients {
            validate_username(recipient)?;
        }

        self.store
            .encrypt_for(&path, plaintext.as_bytes(), recipients)
            .await?;
        self.cache
            .set_field(None, origin, uid, field_name, plaintext.to_string());

        tracing::debug!(origin, uid, field_name, recipients = ?recipients, "field encrypted");
        Ok(())
    }

    /// Replace the recipients of an existing field value.
    pub async fn reencrypt_field(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        shared_users: &[String],
    ) -> Result<(), ParanoidError> {
        let plaintext = self
            .decrypt_field(origin, uid, field_name)
            .await?
            .ok_or_else(|| ParanoidError::FieldNotFound {
                origin: origin.to_string(),
                uid: uid.to_string(),
                field_name: field_name.to_string(),
            })?;
        self.encrypt_field(origin, uid, field_name, &plaintext, shared_users)
            .await
    }

    /// Set the value of a declared field, keeping its current recipients.
    pub async fn put_field_value(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        plaintext: &str,
    ) -> Result<(), ParanoidError> {
        let _guard = self.locks.lock(LockKey::identity(origin, uid)).await;
        let identity = self.require_identity(origin, uid).await?;
        Self::validate_field_name(&identity, field_name)?;

        let shared_with = identity
            .field(field_name)
            .map(|meta| meta.shared_with.clone())
            .unwrap_or_default();
        self.encrypt_field(origin, uid, field_name, plaintext, &shared_with)
            .await
    }
}
