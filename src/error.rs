//! Error taxonomy for the client.
//!
//! DESIGN
//! ======
//! Each family maps to one recovery policy:
//! - `ValidationError`: local, never reaches the network, shown inline.
//! - `SnapshotError::NotFound`: forces deauthentication.
//! - `ServerError`: logged, the view keeps its last-known state.
//! - `ActionError`: logged only.
//!
//! None of these are fatal to the process.

/// Rejected nickname input. Produced before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("nickname must be at least {min} characters")]
    TooShort { min: usize },
    #[error("nickname must be at most {max} characters")]
    TooLong { max: usize },
    #[error("nickname contains characters that are not allowed")]
    InvalidCharacters,
    /// Raised while typing, before the draft is submitted.
    #[error("only letters (A-Z, А-Я), digits (0-9), _ and - are allowed")]
    DisallowedInput,
}

/// Non-2xx response or transport failure on a request/response call.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{reason}")]
    Rejected { status: u16, reason: String },
    #[error("could not connect to server")]
    Transport(#[from] reqwest::Error),
}

/// Failure of `SessionClient::register`.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Failure of `SessionClient::fetch_snapshot`.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The server does not know this player; the local identity is stale.
    #[error("player `{username}` not found")]
    NotFound { username: String },
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Failure of `ActionDispatcher::send_action`.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("action rejected with status {status}")]
    Rejected { status: u16 },
    #[error("action request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Local identity persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API URL `{0}`: expected http:// or https://")]
    InvalidApiUrl(String),
}
