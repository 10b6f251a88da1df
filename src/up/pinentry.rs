use super::{UpError, UpPrompt, UserPresence};

/// Presence confirmed through a pinentry dialog, standing in for the token button.
pub struct PinentryPresence {
    bin: String,
    timeout_secs: u16,
}

impl PinentryPresence {
    pub fn new(bin: &str, timeout_secs: u16) -> Self {
        Self { bin: bin.to_string(), timeout_secs }
    }
}

impl UserPresence for PinentryPresence {
    fn require(&self, prompt: &UpPrompt) -> Result<(), UpError> {
        let mut dialog = pinentry::ConfirmationDialog::with_binary(&self.bin)
            .ok_or_else(|| UpError::NotFound(self.bin.clone()))?;
        let confirmed = dialog
            .with_title(&prompt.title)
            .with_ok("Confirm")
            .with_cancel("Deny")
            .with_timeout(self.timeout_secs)
            .confirm(&prompt.description);

        match confirmed {
            Ok(true) => Ok(()),
            Ok(false) | Err(pinentry::Error::Cancelled) => Err(UpError::Denied),
            Err(pinentry::Error::Timeout) => Err(UpError::Timeout),
            Err(e) => Err(UpError::Pinentry(e.to_string())),
        }
    }
}
