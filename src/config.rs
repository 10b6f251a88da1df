use std::path::PathBuf;
use std::time::Duration;

use crate::oath::{HashAlgorithm, OathType};
use crate::version::Version;

/// First firmware able to store touch-required credentials.
pub const MIN_TOUCH_VERSION: Version = Version::new(4, 2, 6);
/// First firmware able to store SHA512 credentials.
pub const MIN_SHA512_VERSION: Version = Version::new(4, 3, 1);
/// FIPS firmware range, lower bound inclusive, upper bound exclusive.
pub const FIPS_VERSION_RANGE: (Version, Version) = (Version::new(4, 4, 0), Version::new(4, 5, 0));
/// Firmware in this open interval corrupts an existing credential when a
/// new one extends its id.
pub const OVERWRITE_DEFECT_WINDOW: (Version, Version) =
    (Version::new(4, 0, 0), Version::new(4, 3, 5));
/// HOTP credentials may or may not need touch; ask for it once this elapses.
pub const TOUCH_PROMPT_DELAY: Duration = Duration::from_millis(500);
/// How long the soft token waits for a presence confirmation.
pub const UP_TIMEOUT_SECS: u16 = 15;
/// Firmware below this reports a full token as "command aborted".
pub const NO_SPACE_STATUS_VERSION: Version = Version::new(4, 0, 0);
pub const MAX_CREDENTIALS: usize = 32;
pub const MAX_NAME_LEN: usize = 64;
pub const MIN_SECRET_LEN: usize = 2;
pub const DEFAULT_FIRMWARE: Version = Version::new(5, 4, 3);

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "oathkey", version, about)]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Token file (defaults to the XDG data dir).
    #[arg(long, global = true)]
    pub token: Option<PathBuf>,
    /// Remembered-password file (defaults to the XDG config dir).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    #[arg(long, default_value = "pinentry", global = true)]
    pub pinentry: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Display status of the OATH application.
    Info,
    /// Wipe all credentials and the password.
    Reset {
        #[arg(short, long)]
        force: bool,
    },
    /// Manage password protection.
    #[command(subcommand)]
    Access(AccessCommand),
    /// Manage and use OATH accounts.
    #[command(subcommand)]
    Accounts(AccountsCommand),
    /// Manage the emulated token file.
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct UnlockArgs {
    /// Password used to unlock the token.
    #[arg(short, long)]
    pub password: Option<String>,
    /// Remember the password on this machine.
    #[arg(short, long)]
    pub remember: bool,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum AccessCommand {
    /// Set, change or clear the password.
    Change {
        #[arg(short, long)]
        password: Option<String>,
        #[arg(short, long, conflicts_with = "new_password")]
        clear: bool,
        #[arg(short, long)]
        new_password: Option<String>,
    },
    /// Store the token password on this computer.
    Remember {
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Remove a stored password from this computer.
    Forget {
        /// Remove every stored password.
        #[arg(short, long)]
        all: bool,
    },
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum AccountsCommand {
    /// Add a new credential.
    Add(AddArgs),
    /// Add a new credential from an otpauth:// URI.
    Uri {
        uri: Option<String>,
        #[arg(short, long)]
        touch: bool,
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        unlock: UnlockArgs,
    },
    /// List all credentials.
    List {
        #[arg(short = 'H', long)]
        show_hidden: bool,
        /// Display the OATH type.
        #[arg(short, long)]
        oath_type: bool,
        /// Display the period.
        #[arg(long)]
        period: bool,
        #[command(flatten)]
        unlock: UnlockArgs,
    },
    /// Generate codes.
    Code {
        #[arg(default_value = "")]
        query: String,
        #[arg(short = 'H', long)]
        show_hidden: bool,
        /// Require a single match and print only the code.
        #[arg(short, long)]
        single: bool,
        #[command(flatten)]
        unlock: UnlockArgs,
    },
    /// Delete a credential.
    Delete {
        query: String,
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        unlock: UnlockArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct AddArgs {
    pub name: String,
    /// Base32 secret; prompted for when omitted.
    pub secret: Option<String>,
    #[arg(short, long, default_value = "totp")]
    pub oath_type: OathType,
    #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(6..=8))]
    pub digits: u8,
    #[arg(short, long, default_value = "sha1")]
    pub algorithm: HashAlgorithm,
    #[arg(short, long, default_value_t = 0)]
    pub counter: u32,
    #[arg(short, long)]
    pub issuer: Option<String>,
    /// Seconds a TOTP code is valid.
    #[arg(long, default_value_t = crate::oath::DEFAULT_PERIOD)]
    pub period: u32,
    /// Require touch to generate codes.
    #[arg(short, long)]
    pub touch: bool,
    #[arg(short, long)]
    pub force: bool,
    #[command(flatten)]
    pub unlock: UnlockArgs,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum TokenCommand {
    /// Create an empty token file.
    Init {
        #[arg(long, default_value_t = DEFAULT_FIRMWARE)]
        firmware: Version,
        /// Overwrite an existing token file.
        #[arg(short, long)]
        force: bool,
    },
}

impl Config {
    pub fn token_path(&self) -> anyhow::Result<PathBuf> {
        match &self.token {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("token.cbor")),
        }
    }

    pub fn settings_path(&self) -> anyhow::Result<PathBuf> {
        match &self.settings {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.config_dir().join("oath.json")),
        }
    }
}

fn project_dirs() -> anyhow::Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "oathkey")
        .ok_or_else(|| anyhow::anyhow!("cannot determine XDG directories"))
}
