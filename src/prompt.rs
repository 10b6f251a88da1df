use std::io::{BufRead, Write};

use secrecy::ExposeSecret;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("pinentry binary not found: {0}")]
    NotFound(String),
    #[error("prompt cancelled")]
    Cancelled,
    #[error("pinentry: {0}")]
    Pinentry(String),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Interaction with the human at the keyboard.
///
/// `Sync` because the touch notification may fire from a timer thread while
/// the caller is blocked on the token.
pub trait Prompter: Sync {
    /// Read a secret without echo. With `confirm`, ask twice and require a match.
    fn prompt_hidden(&self, text: &str, confirm: bool) -> Result<String, PromptError>;
    fn prompt(&self, text: &str) -> Result<String, PromptError>;
    fn confirm(&self, text: &str) -> Result<bool, PromptError>;
    /// Tell the user to touch the token. Fire-and-forget.
    fn touch_requested(&self);
}

pub struct PinentryPrompter {
    bin: String,
}

impl PinentryPrompter {
    pub fn new(bin: &str) -> Self {
        Self { bin: bin.to_string() }
    }
}

impl Prompter for PinentryPrompter {
    fn prompt_hidden(&self, text: &str, confirm: bool) -> Result<String, PromptError> {
        let mut input = pinentry::PassphraseInput::with_binary(&self.bin)
            .ok_or_else(|| PromptError::NotFound(self.bin.clone()))?;
        input.with_title("oathkey").with_description(text).with_prompt("Password:");
        if confirm {
            input.with_confirmation("Confirm password:", "Passwords do not match");
        }
        match input.interact() {
            Ok(secret) => Ok(secret.expose_secret().to_string()),
            Err(pinentry::Error::Cancelled) => Err(PromptError::Cancelled),
            Err(e) => Err(PromptError::Pinentry(e.to_string())),
        }
    }

    fn prompt(&self, text: &str) -> Result<String, PromptError> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{text}: ")?;
        stderr.flush()?;
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn confirm(&self, text: &str) -> Result<bool, PromptError> {
        let mut dialog = pinentry::ConfirmationDialog::with_binary(&self.bin)
            .ok_or_else(|| PromptError::NotFound(self.bin.clone()))?;
        match dialog.with_title("oathkey").with_ok("Yes").with_cancel("No").confirm(text) {
            Ok(answer) => Ok(answer),
            Err(pinentry::Error::Cancelled) => Ok(false),
            Err(e) => Err(PromptError::Pinentry(e.to_string())),
        }
    }

    fn touch_requested(&self) {
        eprintln!("Touch your token now...");
    }
}
