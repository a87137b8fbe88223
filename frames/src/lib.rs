//! Shared wire model for the clicker HTTP API and live channels.
//!
//! Live channels carry JSON text envelopes shaped `{ "type": ..., "data": ... }`.
//! The envelope keeps `data` as a raw `serde_json::Value` so that message kinds
//! this client does not know about can be skipped without failing the decode.
//! Typed payloads are only materialized by [`Envelope::into_push`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope `type` carried on the per-user channel.
pub const SCORE_UPDATE: &str = "score_update";
/// Envelope `type` carried on the leaderboard channel.
pub const LEADERBOARD_UPDATE: &str = "leaderboard_update";

/// Error returned while decoding a live-channel message.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text was not a JSON envelope.
    #[error("failed to decode envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    /// The envelope `type` was recognized but `data` did not match its schema.
    #[error("invalid `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One message on a live channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind, e.g. `"score_update"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: Value,
    /// Optional server-assigned sequence number, monotonic per stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl Envelope {
    /// Build a `score_update` envelope.
    #[must_use]
    pub fn score_update(update: &ScoreUpdate) -> Self {
        Self {
            kind: SCORE_UPDATE.to_owned(),
            data: serde_json::to_value(update).unwrap_or(Value::Null),
            seq: None,
        }
    }

    /// Build a `leaderboard_update` envelope.
    #[must_use]
    pub fn leaderboard_update(entries: &[LeaderboardEntry]) -> Self {
        Self {
            kind: LEADERBOARD_UPDATE.to_owned(),
            data: serde_json::to_value(entries).unwrap_or(Value::Null),
            seq: None,
        }
    }

    /// Attach a sequence number.
    #[must_use]
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Interpret the payload according to `kind`.
    ///
    /// Unknown kinds are not an error: they come back as [`Push::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Payload`] when a known kind carries malformed data.
    pub fn into_push(self) -> Result<Push, CodecError> {
        match self.kind.as_str() {
            SCORE_UPDATE => serde_json::from_value(self.data)
                .map(Push::Score)
                .map_err(|source| CodecError::Payload { kind: SCORE_UPDATE, source }),
            LEADERBOARD_UPDATE => serde_json::from_value(self.data)
                .map(Push::Leaderboard)
                .map_err(|source| CodecError::Payload { kind: LEADERBOARD_UPDATE, source }),
            _ => Ok(Push::Unknown(self.kind)),
        }
    }
}

/// Typed view of an [`Envelope`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Push {
    /// The subscribed player's score and rank changed.
    Score(ScoreUpdate),
    /// The global leaderboard, in rank order. Replaces any previous one.
    Leaderboard(Vec<LeaderboardEntry>),
    /// A message kind this client does not handle.
    Unknown(String),
}

/// Payload of `score_update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub new_score: u64,
    pub position: u32,
}

/// One leaderboard row as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u64,
    /// 1-based rank. Some servers omit it; list order is the rank then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Response body of `GET /user/{username}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub score: u64,
    pub position: u32,
}

/// Request body of `POST /register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub score: u64,
}

/// Request body of `POST /click`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRequest {
    pub username: String,
    pub is_drag: bool,
}

/// Error body returned with non-2xx responses.
///
/// `detail` is usually a string, but validation failures may return a list
/// of structured problems, so it is kept as raw JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Human-readable reason, if the server supplied one.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Decode a live-channel text message.
///
/// # Errors
///
/// Returns [`CodecError::Envelope`] when `text` is not an envelope.
pub fn decode_envelope(text: &str) -> Result<Envelope, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode an envelope as channel text.
#[must_use]
pub fn encode_envelope(envelope: &Envelope) -> String {
    // Serializing a struct of strings, numbers and `Value` cannot fail.
    serde_json::to_string(envelope).unwrap_or_default()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
