//! Deciding how to obtain a code for a matched credential.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::config::TOUCH_PROMPT_DELAY;
use crate::oath::steam::format_steam;
use crate::oath::{Code, Credential, OathType, DEFAULT_PERIOD};
use crate::prompt::Prompter;
use crate::store::{otp, CredentialStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("Touch credential timed out!")]
    TouchTimeout,
    #[error("store: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CodeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SecurityConditionNotSatisfied => Self::TouchTimeout,
            other => Self::Store(other),
        }
    }
}

/// Produce a code for `credential`.
///
/// `precomputed` is the value from a batch calculation, if any. It is only
/// reused for plain TOTP credentials: Steam codes, touch credentials and
/// HOTP credentials are always recomputed.
pub fn resolve(
    store: &mut dyn CredentialStore,
    prompter: &dyn Prompter,
    credential: &Credential,
    precomputed: Option<&Code>,
    timestamp: u64,
) -> Result<Code, CodeError> {
    if credential.touch_required {
        prompter.touch_requested();
    }

    if credential.is_steam() {
        return steam_code(store, credential, timestamp);
    }

    if credential.touch_required {
        return Ok(store.calculate_code(credential, timestamp)?);
    }

    match (credential.oath_type, precomputed) {
        (OathType::Hotp, _) => {
            // Touch may be required without us knowing; nudge the user if the
            // token has not answered by the time a touch would be needed.
            let code = with_touch_prompt_after(prompter, TOUCH_PROMPT_DELAY, || {
                store.calculate_code(credential, timestamp)
            })?;
            Ok(code)
        }
        (OathType::Totp, Some(code)) => Ok(code.clone()),
        (OathType::Totp, None) => Ok(store.calculate_code(credential, timestamp)?),
    }
}

fn steam_code(
    store: &mut dyn CredentialStore,
    credential: &Credential,
    timestamp: u64,
) -> Result<Code, CodeError> {
    let challenge = otp::totp_challenge(timestamp, credential.period.unwrap_or(DEFAULT_PERIOD));
    let digest = store.calculate(&credential.id, &challenge)?;
    let value = format_steam(&digest)
        .ok_or_else(|| StoreError::Corrupt("short HMAC response".into()))?;
    Ok(Code::new(credential, timestamp, value))
}

/// Run `f`; if it has not returned after `delay`, ask for a touch.
pub fn with_touch_prompt_after<T>(
    prompter: &dyn Prompter,
    delay: Duration,
    f: impl FnOnce() -> T,
) -> T {
    let (done_tx, done_rx) = mpsc::channel::<()>();
    thread::scope(|s| {
        s.spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(delay) {
                prompter.touch_requested();
            }
        });
        let out = f();
        drop(done_tx);
        out
    })
}

/// What a listing shows in the code column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeDisplay {
    Value(String),
    AwaitingTouch,
    AwaitingCounter,
    Unavailable,
}

impl CodeDisplay {
    pub fn for_entry(credential: &Credential, code: Option<&Code>) -> Self {
        match code {
            Some(code) => Self::Value(code.value.clone()),
            None if credential.touch_required => Self::AwaitingTouch,
            None if credential.oath_type == OathType::Hotp => Self::AwaitingCounter,
            None => Self::Unavailable,
        }
    }
}

impl fmt::Display for CodeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(v),
            Self::AwaitingTouch => f.write_str("[Touch Credential]"),
            Self::AwaitingCounter => f.write_str("[HOTP Credential]"),
            Self::Unavailable => Ok(()),
        }
    }
}

/// Display values for a batch listing. Steam credentials are recomputed;
/// a touch timeout only degrades that one row.
pub fn batch_display(
    store: &mut dyn CredentialStore,
    entries: &[(&Credential, Option<&Code>)],
    timestamp: u64,
) -> Result<Vec<CodeDisplay>, CodeError> {
    let mut out = Vec::with_capacity(entries.len());
    for (credential, code) in entries {
        let display = if credential.is_steam() {
            match steam_code(store, credential, timestamp) {
                Ok(code) => CodeDisplay::Value(code.value),
                Err(CodeError::TouchTimeout) => {
                    tracing::warn!(id = %credential.id, "Touch timed out, skipping");
                    CodeDisplay::AwaitingTouch
                }
                Err(e) => return Err(e),
            }
        } else {
            CodeDisplay::for_entry(credential, *code)
        };
        out.push(display);
    }
    Ok(out)
}
