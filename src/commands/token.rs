use std::io::Write;
use std::path::Path;

use super::Session;
use crate::error::{Error, Result};
use crate::store::SoftToken;
use crate::version::Version;

pub fn info(s: &mut Session<'_>, out: &mut dyn Write) -> Result<()> {
    let version = s.store.version();
    let locked = s.store.locked();
    writeln!(out, "OATH version: {version}")?;
    writeln!(out, "Password protection: {}", if locked { "enabled" } else { "disabled" })?;
    if locked && s.keys.contains(s.store.device_id()) {
        writeln!(out, "The password for this token is remembered.")?;
    }
    if version.is_fips() {
        writeln!(out, "FIPS Approved Mode: {}", if locked { "Yes" } else { "No" })?;
    }
    Ok(())
}

/// Wipe the token. The remembered key for the old device id goes too.
pub fn reset(s: &mut Session<'_>, out: &mut dyn Write, force: bool) -> Result<()> {
    if !force {
        let question = "WARNING! This will delete all stored OATH accounts \
                        and restore factory settings. Proceed?";
        if !s.prompter.confirm(question)? {
            return Err(Error::Aborted("Reset aborted by user.".into()));
        }
    }
    writeln!(out, "Resetting OATH data...")?;
    let old_id = s.store.device_id().to_string();
    s.store.reset()?;
    if s.keys.remove(&old_id) {
        s.keys.persist()?;
    }
    writeln!(out, "Success! All OATH accounts have been cleared from the token.")?;
    Ok(())
}

pub fn init(path: &Path, out: &mut dyn Write, firmware: Version, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Aborted(format!(
            "Token file {} already exists, use --force to replace it.",
            path.display()
        )));
    }
    SoftToken::create(path, firmware)?;
    writeln!(out, "Created token with firmware {firmware} at {}", path.display())?;
    Ok(())
}
