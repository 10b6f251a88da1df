use std::io::Write;

use super::Session;
use crate::auth;
use crate::error::Result;
use crate::keycache::KeyCache;

/// Set, change or clear the token password.
pub fn change(
    s: &mut Session<'_>,
    out: &mut dyn Write,
    password: Option<&str>,
    clear: bool,
    new_password: Option<&str>,
) -> Result<()> {
    auth::unlock_with_prompt(
        s.store,
        s.keys,
        s.prompter,
        password,
        false,
        "Enter the current password",
    )?;
    let device_id = s.store.device_id().to_string();

    if clear {
        s.store.unset_key()?;
        if s.keys.remove(&device_id) {
            s.keys.persist()?;
        }
        writeln!(out, "Password cleared from the token.")?;
        return Ok(());
    }

    let new_password = match new_password.filter(|p| !p.is_empty()) {
        Some(p) => p.to_string(),
        None => s.prompter.prompt_hidden("Enter the new password", true)?,
    };
    let key = s.store.derive_key(&new_password);
    s.store.set_key(&key)?;
    writeln!(out, "Password updated.")?;
    if s.keys.contains(&device_id) {
        s.keys.set(&device_id, &key);
        s.keys.persist()?;
        writeln!(out, "Password remembered.")?;
    }
    Ok(())
}

pub fn remember(s: &mut Session<'_>, out: &mut dyn Write, password: Option<&str>) -> Result<()> {
    let device_id = s.store.device_id().to_string();
    if !s.store.locked() {
        // A stale entry from before the password was cleared elsewhere
        if s.keys.remove(&device_id) {
            s.keys.persist()?;
        }
        writeln!(out, "This token is not password protected.")?;
        return Ok(());
    }

    let password = match password.filter(|p| !p.is_empty()) {
        Some(p) => p.to_string(),
        None => s.prompter.prompt_hidden("Enter the password", false)?,
    };
    let key = s.store.derive_key(&password);
    auth::validate_key(s.store, s.keys, &key, true)?;
    writeln!(out, "Password remembered.")?;
    Ok(())
}

pub fn forget(s: &mut Session<'_>, out: &mut dyn Write) -> Result<()> {
    let device_id = s.store.device_id().to_string();
    if s.keys.remove(&device_id) {
        s.keys.persist()?;
        writeln!(out, "Password forgotten.")?;
    } else {
        writeln!(out, "No password stored for this token.")?;
    }
    Ok(())
}

/// Needs no token: only the key cache is touched.
pub fn forget_all(keys: &mut KeyCache, out: &mut dyn Write) -> Result<()> {
    keys.clear();
    keys.persist()?;
    writeln!(out, "All passwords have been forgotten.")?;
    Ok(())
}
