//! Networking: HTTP request/response calls and live WebSocket channels.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` registers players and fetches snapshots, `action` submits clicks
//! and feeds, `channel` owns the two push subscriptions, and `reconnect`
//! decides how a dropped channel comes back.

pub mod action;
pub mod channel;
pub mod reconnect;
pub mod session;

#[cfg(test)]
pub(crate) mod test_server;
