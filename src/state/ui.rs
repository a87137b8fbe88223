//! Ephemeral UI flags.

use crate::error::ValidationError;
use crate::identity::is_allowed_char;

/// Registration form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub draft: String,
    pub error: Option<String>,
    /// A `Register` effect is in flight.
    pub pending: bool,
}

impl RegistrationForm {
    /// Accept `text` only if every character is allowed. Empty is fine.
    pub fn edit(&mut self, text: String) {
        if text.chars().all(is_allowed_char) {
            self.draft = text;
            self.error = None;
        } else {
            self.error = Some(ValidationError::DisallowedInput.to_string());
        }
    }
}

/// Character animation flags.
///
/// Each timed flag remembers the token of the interaction that set it, so a
/// settle timer only clears the flag it was scheduled for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFlags {
    pub is_eating: bool,
    pub is_smiling: bool,
    pub is_dragging: bool,
    smile_token: Option<u64>,
    eat_token: Option<u64>,
}

impl CharacterFlags {
    pub fn clicked(&mut self, token: u64) {
        self.is_smiling = true;
        self.smile_token = Some(token);
    }

    pub fn drag_started(&mut self) {
        self.is_dragging = true;
        self.is_smiling = true;
        // Held smile: no timer owns it.
        self.smile_token = None;
    }

    pub fn drag_ended(&mut self) {
        self.is_dragging = false;
        self.is_smiling = false;
        self.smile_token = None;
    }

    pub fn fed(&mut self, token: u64) {
        self.is_eating = true;
        self.is_dragging = false;
        self.eat_token = Some(token);
    }

    /// Clear whatever `token` set, if it is still the owner.
    pub fn settle(&mut self, token: u64) {
        if self.smile_token == Some(token) {
            self.is_smiling = false;
            self.smile_token = None;
        }
        if self.eat_token == Some(token) {
            self.is_eating = false;
            self.eat_token = None;
        }
    }
}
