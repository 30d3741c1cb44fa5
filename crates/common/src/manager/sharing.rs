use url::form_urlencoded;

use super::locks::LockKey;
use super::{validate_username, Manager, ParanoidError};
use crate::identity::Identity;

const SHARE_REQUEST_URI: &str = "web+paranoid://share_request";

/// The link a recipient's extension opens to accept a shared field.
///
/// `from` is the user who shared it.
pub fn share_request_uri(origin: &str, uid: &str, field_name: &str, from: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("origin", origin)
        .append_pair("uid", uid)
        .append_pair("field_name", field_name)
        .append_pair("username", from)
        .finish();
    format!("{}?{}", SHARE_REQUEST_URI, query)
}

/// Chat message carrying a share request link
fn share_request_message(to: &str, uri: &str) -> String {
    format!(
        "Hi @{}, I would like to share my information with you on Paranoid! :ghost:\n\n\
         Please copy and paste the following URL into your Paranoid-enabled browser \
         to accept my share request, thank you! :smile:\n\n\
         ```\n{}\n```\n",
        to, uri
    )
}

impl Manager {
    /// Grant `username` access to a field.
    ///
    /// Appends the user, re-encrypts the value for everyone on the list,
    /// persists the metadata and finally tells the user about it.
    ///
    /// # Returns
    /// The updated identity
    pub async fn share(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        username: &str,
    ) -> Result<Identity, ParanoidError> {
        validate_username(username)?;

        let identity = {
            let _guard = self.locks.lock(LockKey::identity(origin, uid)).await;
            let mut identity = self.require_identity(origin, uid).await?;
            Self::validate_field_name(&identity, field_name)?;

            let meta = identity
                .field_mut(field_name)
                .ok_or_else(|| ParanoidError::InvalidField(field_name.to_string()))?;
            if meta.is_shared_with(username) {
                return Err(ParanoidError::AlreadyShared {
                    field_name: field_name.to_string(),
                    username: username.to_string(),
                });
            }
            meta.shared_with.push(username.to_string());
            let shared_with = meta.shared_with.clone();

            self.reencrypt_field(origin, uid, field_name, &shared_with)
                .await?;
            self.write_identity(origin, uid, &identity).await?;
            identity
        };

        tracing::info!(origin, uid, field_name, username, "field shared");

        if let Err(e) = self
            .send_share_notification(origin, uid, field_name, username)
            .await
        {
            tracing::warn!(username, error = %e, "could not send share notification");
        }

        Ok(identity)
    }

    /// Revoke one grant of a field from `username`.
    ///
    /// # Returns
    /// The updated identity
    pub async fn unshare(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        username: &str,
    ) -> Result<Identity, ParanoidError> {
        validate_username(username)?;

        let _guard = self.locks.lock(LockKey::identity(origin, uid)).await;
        let mut identity = self.require_identity(origin, uid).await?;
        Self::validate_field_name(&identity, field_name)?;

        let meta = identity
            .field_mut(field_name)
            .ok_or_else(|| ParanoidError::InvalidField(field_name.to_string()))?;
        let Some(position) = meta.shared_with.iter().position(|u| u == username) else {
            return Err(ParanoidError::NotShared {
                field_name: field_name.to_string(),
                username: username.to_string(),
            });
        };
        meta.shared_with.remove(position);
        let shared_with = meta.shared_with.clone();

        self.reencrypt_field(origin, uid, field_name, &shared_with)
            .await?;
        self.write_identity(origin, uid, &identity).await?;

        tracing::info!(origin, uid, field_name, username, "field unshared");
        Ok(identity)
    }

    /// Tell `username` that a field was shared with them.
    ///
    /// Does nothing when chat is disabled.
    pub async fn send_share_notification(
        &self,
        origin: &str,
        uid: &str,
        field_name: &str,
        username: &str,
    ) -> Result<(), ParanoidError> {
        if self.config.disable_chat {
            tracing::debug!(username, "chat disabled, not sending share notification");
            return Ok(());
        }

        let uri = share_request_uri(origin, uid, field_name, self.username());
        self.store
            .notify(username, &share_request_message(username, &uri))
            .await?;
        Ok(())
    }
}
