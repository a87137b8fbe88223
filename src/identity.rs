//! Player identity and its local persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! The nickname is the only identity: no secrets, no tokens. It is chosen and
//! validated on the client, registered with the server, then persisted so a
//! later start can resume the session without prompting again.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{IdentityError, ValidationError};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 12;

/// Key the username is persisted under.
pub const STORAGE_KEY: &str = "clickerGameUsername";

/// A validated nickname.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
}

impl Identity {
    /// Validate `raw` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: too short, too long, then disallowed
    /// characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_username(raw)?;
        Ok(Self { username: raw.to_owned() })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// ASCII letters, Cyrillic `А-Я`/`а-я`, digits, `_` and `-`.
#[must_use]
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || ('\u{0410}'..='\u{044F}').contains(&c)
}

/// Check length (in characters, not bytes) and charset.
///
/// # Errors
///
/// See [`Identity::parse`].
pub fn validate_username(raw: &str) -> Result<(), ValidationError> {
    let len = raw.chars().count();
    if len < USERNAME_MIN_CHARS {
        return Err(ValidationError::TooShort { min: USERNAME_MIN_CHARS });
    }
    if len > USERNAME_MAX_CHARS {
        return Err(ValidationError::TooLong { max: USERNAME_MAX_CHARS });
    }
    if !raw.chars().all(is_allowed_char) {
        return Err(ValidationError::InvalidCharacters);
    }
    Ok(())
}

// =============================================================================
// STORE
// =============================================================================

/// Durable storage for the chosen identity.
///
/// `load` never fails: unreadable or invalid data counts as "no identity".
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Option<Identity>;
    fn save(&self, identity: &Identity) -> Result<(), IdentityError>;
    fn clear(&self) -> Result<(), IdentityError>;
}

#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    #[serde(rename = "clickerGameUsername")]
    username: String,
}

/// JSON file holding `{ "clickerGameUsername": "<name>" }`.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Option<Identity> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "identity file unreadable");
                return None;
            }
        };
        let stored: StoredIdentity = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "identity file corrupt");
                return None;
            }
        };
        match Identity::parse(&stored.username) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "stored username rejected");
                None
            }
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&StoredIdentity { username: identity.username().to_owned() })?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    slot: Mutex<Option<Identity>>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn with_identity(identity: Identity) -> Self {
        Self { slot: Mutex::new(Some(identity)) }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<Identity> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn save(&self, identity: &Identity) -> Result<(), IdentityError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
