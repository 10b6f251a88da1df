//! Checking a candidate credential against device limits before storing it.

use crate::config::{
    MAX_NAME_LEN, MIN_SECRET_LEN, MIN_SHA512_VERSION, MIN_TOUCH_VERSION, OVERWRITE_DEFECT_WINDOW,
};
use crate::oath::{Credential, CredentialData, HashAlgorithm, OathType};
use crate::prompt::{PromptError, Prompter};
use crate::store::{CredentialStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AdmitError {
    #[error("Name must be between 1 and {MAX_NAME_LEN} bytes.")]
    InvalidName,
    #[error("Secret must be at least {MIN_SECRET_LEN} bytes.")]
    SecretTooShort,
    #[error("Require touch is not supported on this token.")]
    UnsupportedTouch,
    #[error("Counter only supported for HOTP accounts.")]
    CounterNotApplicable,
    #[error("Algorithm SHA512 not supported on this token.")]
    UnsupportedAlgorithm,
    #[error("Choose a name that is not a prefix of an existing account name.")]
    UnsafeOverwriteName,
    #[error("No space left on the token.")]
    StorageFull,
    #[error("Account not added.")]
    Aborted,
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Validate `candidate` and store it.
///
/// Checks run in a fixed order and the first failure wins. Nothing is
/// written to the store unless every check passes.
pub fn validate_and_admit(
    store: &mut dyn CredentialStore,
    prompter: &dyn Prompter,
    candidate: &CredentialData,
    touch: bool,
    force: bool,
) -> Result<Credential, AdmitError> {
    let version = store.version();

    if candidate.name.is_empty() || candidate.name.len() > MAX_NAME_LEN {
        return Err(AdmitError::InvalidName);
    }
    if candidate.secret.len() < MIN_SECRET_LEN {
        return Err(AdmitError::SecretTooShort);
    }
    if touch && version < MIN_TOUCH_VERSION {
        return Err(AdmitError::UnsupportedTouch);
    }
    if candidate.counter != 0 && candidate.oath_type != OathType::Hotp {
        return Err(AdmitError::CounterNotApplicable);
    }
    if candidate.hash_algorithm == HashAlgorithm::Sha512
        && (version < MIN_SHA512_VERSION || version.is_fips())
    {
        return Err(AdmitError::UnsupportedAlgorithm);
    }

    let id = candidate.id();
    let existing = store.list_credentials()?;

    if !force && existing.iter().any(|c| c.id == id) {
        let question = format!("An account called {id} already exists on this token. Overwrite?");
        if !prompter.confirm(&question)? {
            return Err(AdmitError::Aborted);
        }
    }

    let (lower, upper) = OVERWRITE_DEFECT_WINDOW;
    if version.is_strictly_between(lower, upper)
        && existing.iter().any(|c| id.strictly_extends(&c.id))
    {
        return Err(AdmitError::UnsafeOverwriteName);
    }

    match store.put_credential(candidate, touch) {
        Ok(credential) => {
            tracing::info!(id = %credential.id, touch, "Account added");
            Ok(credential)
        }
        // Older firmware answers a full store with a generic abort
        Err(StoreError::NoSpace | StoreError::CommandAborted) => Err(AdmitError::StorageFull),
        Err(e) => Err(e.into()),
    }
}
