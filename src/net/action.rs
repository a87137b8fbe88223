//! Fire-and-forget game actions.
//!
//! The server answers `POST /click` with the new score, but the client ignores
//! it: the authoritative update arrives on the user channel. Failures are
//! logged and otherwise swallowed.

use frames::ClickRequest;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ActionError;

/// What the player did to the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Single click: worth 1 point.
    Click,
    /// Food dropped on the character: worth 10 points.
    Feed,
}

impl ActionKind {
    /// Wire flag telling the server to award the bulk amount.
    #[must_use]
    pub fn is_bulk_feed(self) -> bool {
        matches!(self, Self::Feed)
    }
}

#[derive(Clone)]
pub struct ActionDispatcher {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ActionDispatcher {
    #[must_use]
    pub fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// Submit one action and wait for the server to accept it.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] for transport failures or non-2xx responses.
    pub async fn send_action(&self, username: &str, kind: ActionKind) -> Result<(), ActionError> {
        let body = ClickRequest { username: username.to_owned(), is_drag: kind.is_bulk_feed() };
        let response = self
            .http
            .post(self.config.api_endpoint(&["click"]))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::Rejected { status: status.as_u16() });
        }
        debug!(%username, ?kind, "action accepted");
        Ok(())
    }

    /// Submit in the background. Never blocks the caller; failures are logged.
    pub fn dispatch(&self, username: String, kind: ActionKind) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.send_action(&username, kind).await {
                warn!(%username, ?kind, error = %e, "action failed");
            }
        })
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
