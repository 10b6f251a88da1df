pub mod admission;
pub mod auth;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod keycache;
pub mod matcher;
pub mod oath;
pub mod prompt;
pub mod resolver;
pub mod store;
pub mod up;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

use std::path::Path;

use anyhow::Context;

use commands::Session;
use config::{AccessCommand, AccountsCommand, Command, Config, TokenCommand, UP_TIMEOUT_SECS};
use keycache::KeyCache;
use prompt::PinentryPrompter;
use store::{disk, SoftToken, StoreError};
use up::PinentryPresence;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    let token_path = cfg.token_path()?;
    let settings_path = cfg.settings_path()?;
    tracing::debug!(
        token = %token_path.display(),
        settings = %settings_path.display(),
        "Paths resolved"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Commands that never open the token
    match &cfg.command {
        Command::Token(TokenCommand::Init { firmware, force }) => {
            let mut lock = disk::session_lock(&token_path)?;
            let _guard = lock.try_write().map_err(|_| StoreError::Busy)?;
            commands::token::init(&token_path, &mut out, *firmware, *force)?;
            return Ok(());
        }
        Command::Access(AccessCommand::Forget { all: true }) => {
            let mut keys = KeyCache::load(&settings_path)?;
            commands::access::forget_all(&mut keys, &mut out)?;
            return Ok(());
        }
        _ => {}
    }

    diagnostics::check(&cfg, &token_path)?;

    let mut lock = disk::session_lock(&token_path)?;
    let _guard = lock
        .try_write()
        .map_err(|_| StoreError::Busy)
        .with_context(|| format!("lock {}", token_path.display()))?;

    let mut store = open_token(&token_path, &cfg.pinentry)?;
    let mut keys = KeyCache::load(&settings_path)?;
    let prompter = PinentryPrompter::new(&cfg.pinentry);
    let mut session = Session {
        store: &mut store,
        keys: &mut keys,
        prompter: &prompter,
    };

    dispatch(&mut session, &mut out, &cfg.command)?;
    Ok(())
}

fn open_token(path: &Path, pinentry: &str) -> anyhow::Result<SoftToken> {
    let presence = PinentryPresence::new(pinentry, UP_TIMEOUT_SECS);
    let store = SoftToken::open(path, Box::new(presence))
        .with_context(|| format!("open token {}", path.display()))?;
    tracing::info!(count = store.credential_count(), "Token loaded");
    Ok(store)
}

fn dispatch(s: &mut Session<'_>, out: &mut dyn std::io::Write, command: &Command) -> Result<()> {
    match command {
        Command::Info => commands::token::info(s, out),
        Command::Reset { force } => commands::token::reset(s, out, *force),
        Command::Access(access) => match access {
            AccessCommand::Change { password, clear, new_password } => commands::access::change(
                s,
                out,
                password.as_deref(),
                *clear,
                new_password.as_deref(),
            ),
            AccessCommand::Remember { password } => {
                commands::access::remember(s, out, password.as_deref())
            }
            AccessCommand::Forget { .. } => commands::access::forget(s, out),
        },
        Command::Accounts(accounts) => match accounts {
            AccountsCommand::Add(args) => commands::accounts::add(s, args).map(|_| ()),
            AccountsCommand::Uri { uri, touch, force, unlock } => {
                commands::accounts::add_uri(s, uri.as_deref(), *touch, *force, unlock).map(|_| ())
            }
            AccountsCommand::List { show_hidden, oath_type, period, unlock } => {
                commands::accounts::list(s, out, *show_hidden, *oath_type, *period, unlock)
            }
            AccountsCommand::Code { query, show_hidden, single, unlock } => {
                commands::accounts::code(s, out, query, *show_hidden, *single, unlock, now()?)
            }
            AccountsCommand::Delete { query, force, unlock } => {
                commands::accounts::delete(s, out, query, *force, unlock)
            }
        },
        // Runs before a token is opened
        Command::Token(TokenCommand::Init { .. }) => Ok(()),
    }
}

fn now() -> Result<u64> {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(elapsed.as_secs())
}
