pub(crate) mod pinentry;
pub(crate) mod prompt;

pub use pinentry::PinentryPresence;
pub use prompt::{touch_prompt, UpPrompt};

#[derive(Debug, thiserror::Error)]
pub enum UpError {
    #[error("pinentry binary not found: {0}")]
    NotFound(String),
    #[error("user presence timed out")]
    Timeout,
    #[error("user presence denied")]
    Denied,
    #[error("pinentry: {0}")]
    Pinentry(String),
}

/// The token's touch sensor: blocks until a human confirms or the wait ends.
pub trait UserPresence {
    fn require(&self, prompt: &UpPrompt) -> Result<(), UpError>;
}
