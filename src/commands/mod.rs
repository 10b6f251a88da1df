//! Subcommand bodies. Each one runs against an already opened session and
//! writes its user-facing output to `out`.

pub mod access;
pub mod accounts;
pub mod token;

use crate::auth;
use crate::config::UnlockArgs;
use crate::error::Result;
use crate::keycache::KeyCache;
use crate::prompt::Prompter;
use crate::store::CredentialStore;

/// Everything a command needs for one invocation.
pub struct Session<'a> {
    pub store: &'a mut dyn CredentialStore,
    pub keys: &'a mut KeyCache,
    pub prompter: &'a dyn Prompter,
}

impl Session<'_> {
    pub fn unlock(&mut self, args: &UnlockArgs) -> Result<()> {
        auth::unlock(
            self.store,
            self.keys,
            self.prompter,
            args.password.as_deref(),
            args.remember,
        )?;
        Ok(())
    }
}
