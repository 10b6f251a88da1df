//! Unlocking a password-protected store.

use crate::keycache::{KeyCache, KeyCacheError};
use crate::prompt::{PromptError, Prompter};
use crate::store::{AccessKey, CredentialStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong password and failed transport look the same to the caller.
    #[error("Authentication to the token failed. Wrong password?")]
    AuthenticationFailed,
    #[error("Password provided, but no password is set.")]
    UnexpectedPassword,
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),
    #[error("key cache: {0}")]
    KeyCache(#[from] KeyCacheError),
}

/// Unlock `store` if it is locked.
///
/// Key source, in order: `password`, the remembered key for this device,
/// an interactive hidden prompt. No retries.
pub fn unlock(
    store: &mut dyn CredentialStore,
    keys: &mut KeyCache,
    prompter: &dyn Prompter,
    password: Option<&str>,
    remember: bool,
) -> Result<(), AuthError> {
    unlock_with_prompt(store, keys, prompter, password, remember, "Enter the password")
}

/// Same as [`unlock`] with a custom prompt text.
pub fn unlock_with_prompt(
    store: &mut dyn CredentialStore,
    keys: &mut KeyCache,
    prompter: &dyn Prompter,
    password: Option<&str>,
    remember: bool,
    prompt: &str,
) -> Result<(), AuthError> {
    let password = password.filter(|p| !p.is_empty());

    if !store.locked() {
        if password.is_some() {
            return Err(AuthError::UnexpectedPassword);
        }
        return Ok(());
    }

    let device_id = store.device_id().to_string();
    let key = if let Some(password) = password {
        store.derive_key(password)
    } else if let Some(key) = keys.get(&device_id) {
        tracing::debug!(%device_id, "Using remembered key");
        key
    } else {
        let password = prompter.prompt_hidden(prompt, false)?;
        store.derive_key(&password)
    };

    validate_key(store, keys, &key, remember)
}

/// Validate `key` against the store and optionally remember it.
pub fn validate_key(
    store: &mut dyn CredentialStore,
    keys: &mut KeyCache,
    key: &AccessKey,
    remember: bool,
) -> Result<(), AuthError> {
    if let Err(e) = store.validate(key) {
        tracing::debug!(error = %e, "Validation failed");
        return Err(AuthError::AuthenticationFailed);
    }
    if remember {
        keys.set(store.device_id(), key);
        keys.persist()?;
        tracing::info!(device_id = %store.device_id(), "Key remembered");
    }
    Ok(())
}
