#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] crate::auth::AuthError),
    #[error(transparent)]
    Match(#[from] crate::matcher::MatchError),
    #[error(transparent)]
    Code(#[from] crate::resolver::CodeError),
    #[error(transparent)]
    Admit(#[from] crate::admission::AdmitError),
    #[error("Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("Key cache: {0}")]
    KeyCache(#[from] crate::keycache::KeyCacheError),
    #[error("Prompt: {0}")]
    Prompt(#[from] crate::prompt::PromptError),
    #[error("URI: {0}")]
    Uri(#[from] crate::oath::UriError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Aborted(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
