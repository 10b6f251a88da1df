use std::collections::HashMap;
use std::io::Write;

use super::Session;
use crate::admission::validate_and_admit;
use crate::config::{AddArgs, UnlockArgs};
use crate::error::{Error, Result};
use crate::matcher::{require_single, search};
use crate::oath::{parse_b32_key, Code, Credential, CredentialData};
use crate::resolver::{batch_display, resolve, CodeDisplay};

pub fn add(s: &mut Session<'_>, args: &AddArgs) -> Result<Credential> {
    let secret = match &args.secret {
        Some(secret) => parse_b32_key(secret)?,
        None => loop {
            let input = s.prompter.prompt("Enter a secret key (base32)")?;
            match parse_b32_key(&input) {
                Ok(secret) => break secret,
                Err(e) => eprintln!("{e}"),
            }
        },
    };

    let mut data = CredentialData::new(&args.name, secret);
    data.oath_type = args.oath_type;
    data.hash_algorithm = args.algorithm;
    data.digits = args.digits;
    data.counter = args.counter;
    data.period = args.period;
    data.issuer = args.issuer.clone();

    s.unlock(&args.unlock)?;
    Ok(validate_and_admit(s.store, s.prompter, &data, args.touch, args.force)?)
}

pub fn add_uri(
    s: &mut Session<'_>,
    uri: Option<&str>,
    touch: bool,
    force: bool,
    unlock: &UnlockArgs,
) -> Result<Credential> {
    let data = match uri {
        Some(uri) => CredentialData::parse_uri(uri)?,
        None => loop {
            let input = s.prompter.prompt("Enter an OATH URI")?;
            match CredentialData::parse_uri(&input) {
                Ok(data) => break data,
                Err(e) => eprintln!("{e}"),
            }
        },
    };

    s.unlock(unlock)?;
    Ok(validate_and_admit(s.store, s.prompter, &data, touch, force)?)
}

pub fn list(
    s: &mut Session<'_>,
    out: &mut dyn Write,
    show_hidden: bool,
    show_type: bool,
    show_period: bool,
    unlock: &UnlockArgs,
) -> Result<()> {
    s.unlock(unlock)?;
    let mut credentials: Vec<Credential> = s
        .store
        .list_credentials()?
        .into_iter()
        .filter(|c| show_hidden || !c.is_hidden())
        .collect();
    credentials.sort();

    for c in &credentials {
        let mut line = c.display_id();
        if show_type {
            line.push_str(&format!(", {}", c.oath_type));
        }
        if show_period {
            if let Some(period) = c.period {
                line.push_str(&format!(", {period}"));
            }
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Print codes for every credential matching `query`.
///
/// A lone match is resolved fully (touch, HOTP). With `single` exactly one
/// match is required and only its code is printed.
pub fn code(
    s: &mut Session<'_>,
    out: &mut dyn Write,
    query: &str,
    show_hidden: bool,
    single: bool,
    unlock: &UnlockArgs,
    timestamp: u64,
) -> Result<()> {
    s.unlock(unlock)?;
    let entries = s.store.calculate_all(timestamp)?;
    let precomputed: HashMap<&Credential, Option<&Code>> =
        entries.iter().map(|(c, code)| (c, code.as_ref())).collect();
    let mut hits = search(entries.iter().map(|(c, _)| c), query, show_hidden);

    if single {
        let credential = require_single(&hits)?;
        let cached = lookup(&precomputed, credential);
        let code = resolve(s.store, s.prompter, credential, cached, timestamp)?;
        writeln!(out, "{}", code.value)?;
        return Ok(());
    }

    let rows: Vec<(String, CodeDisplay)> = if hits.len() == 1 {
        let credential = hits[0];
        let cached = lookup(&precomputed, credential);
        let code = resolve(s.store, s.prompter, credential, cached, timestamp)?;
        vec![(credential.display_id(), CodeDisplay::Value(code.value))]
    } else {
        hits.sort();
        let batch: Vec<(&Credential, Option<&Code>)> =
            hits.iter().map(|c| (*c, lookup(&precomputed, c))).collect();
        let shown = batch_display(s.store, &batch, timestamp)?;
        hits.iter().map(|c| c.display_id()).zip(shown).collect()
    };

    write_table(out, &rows)
}

fn lookup<'a>(
    precomputed: &HashMap<&Credential, Option<&'a Code>>,
    credential: &Credential,
) -> Option<&'a Code> {
    precomputed.get(credential).copied().flatten()
}

fn write_table(out: &mut dyn Write, rows: &[(String, CodeDisplay)]) -> Result<()> {
    let cells: Vec<(&str, String)> =
        rows.iter().map(|(id, code)| (id.as_str(), code.to_string())).collect();
    let name_width = cells.iter().map(|(id, _)| id.chars().count()).max().unwrap_or(0);
    let code_width = cells.iter().map(|(_, code)| code.chars().count()).max().unwrap_or(0);
    for (id, code) in cells {
        writeln!(out, "{id:<name_width$}  {code:>code_width$}")?;
    }
    Ok(())
}

/// Delete the single credential matching `query`; hidden ones included.
pub fn delete(
    s: &mut Session<'_>,
    out: &mut dyn Write,
    query: &str,
    force: bool,
    unlock: &UnlockArgs,
) -> Result<()> {
    s.unlock(unlock)?;
    let credentials = s.store.list_credentials()?;
    let hits = search(&credentials, query, true);
    let credential = require_single(&hits)?;
    let id = credential.display_id();

    if !force && !s.prompter.confirm(&format!("Delete account: {id} ?"))? {
        return Err(Error::Aborted("Deletion aborted by user.".into()));
    }
    s.store.delete_credential(&credential.id)?;
    writeln!(out, "Deleted {id}.")?;
    Ok(())
}
