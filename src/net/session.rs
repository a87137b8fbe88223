//! Registration and snapshot fetches.
//!
//! ERROR HANDLING
//! ==============
//! Validation runs before any request, so a rejected nickname never costs a
//! round trip. A 404 on the player fetch is reported as
//! `SnapshotError::NotFound`; callers treat it as "forget this identity".
//! Everything else is a `ServerError` the caller logs and moves past.

use std::sync::Arc;

use frames::{ErrorBody, LeaderboardEntry, RegisterRequest, UserRecord};
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{RegisterError, ServerError, SnapshotError};
use crate::identity::{Identity, IdentityStore};
use crate::model::{PlayerState, Snapshot};

#[derive(Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    config: ClientConfig,
    identity: Arc<dyn IdentityStore>,
}

impl SessionClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: ClientConfig, identity: Arc<dyn IdentityStore>) -> Self {
        Self { http, config, identity }
    }

    /// Identity persisted by an earlier session, if any.
    #[must_use]
    pub fn resume(&self) -> Option<Identity> {
        self.identity.load()
    }

    /// Drop the persisted identity. Failures are logged, not returned.
    pub fn forget(&self) {
        if let Err(e) = self.identity.clear() {
            warn!(error = %e, "failed to clear persisted identity");
        }
    }

    /// Validate `username`, create the account with a zero score, and persist
    /// the identity.
    ///
    /// # Errors
    ///
    /// [`RegisterError::Validation`] without touching the network, or
    /// [`RegisterError::Server`] carrying the server's `detail` text.
    pub async fn register(&self, username: &str) -> Result<Identity, RegisterError> {
        let identity = Identity::parse(username)?;

        let body = RegisterRequest { username: identity.username().to_owned(), score: 0 };
        let response = self
            .http
            .post(self.config.api_endpoint(&["register"]))
            .json(&body)
            .send()
            .await
            .map_err(ServerError::from)?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.reason())
                .unwrap_or_else(|| "registration failed".to_owned());
            return Err(ServerError::Rejected { status: status.as_u16(), reason }.into());
        }

        if let Err(e) = self.identity.save(&identity) {
            warn!(username = %identity, error = %e, "registered but failed to persist identity");
        }
        info!(username = %identity, "registered");
        Ok(identity)
    }

    /// Fetch the player's score/rank, then the leaderboard.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::NotFound`] when the server does not know `username`.
    pub async fn fetch_snapshot(&self, username: &str) -> Result<Snapshot, SnapshotError> {
        let player = self.fetch_player(username).await?;
        let leaderboard = self.fetch_leaderboard().await?;
        Ok(Snapshot { player, leaderboard })
    }

    async fn fetch_player(&self, username: &str) -> Result<PlayerState, SnapshotError> {
        let response = self
            .http
            .get(self.config.api_endpoint(&["user", username]))
            .send()
            .await
            .map_err(ServerError::from)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SnapshotError::NotFound { username: username.to_owned() });
        }
        if !status.is_success() {
            return Err(rejected(status, "player fetch failed").into());
        }

        let record = response.json::<UserRecord>().await.map_err(ServerError::from)?;
        Ok(record.into())
    }

    /// Current leaderboard in rank order.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] for non-2xx responses or transport failures.
    pub async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServerError> {
        let response = self
            .http
            .get(self.config.api_endpoint(&["leaderboard"]))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejected(status, "leaderboard fetch failed"));
        }
        Ok(response.json::<Vec<LeaderboardEntry>>().await?)
    }
}

fn rejected(status: StatusCode, what: &str) -> ServerError {
    ServerError::Rejected { status: status.as_u16(), reason: format!("{what}: {}", status.as_u16()) }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
