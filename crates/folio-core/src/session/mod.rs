//! Chat sessions: ordered transcript, simulated typing delay, cancellation on close.
//!
//! State per session: `Idle -> (send) -> AwaitingReply -> (reply ready) -> Idle`.
//! Sends are accepted while a reply is still pending; each reply lands after its
//! own delay, so two in-flight replies may arrive in either order.

mod chat;
mod manager;

pub use chat::ChatSession;
pub use manager::SessionManager;

use crate::shared::{CoreConfig, DEFAULT_REPLY_DELAY_MS, DEFAULT_SESSION_IDLE_SECS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Registry-level session errors. Empty input and late replies are not errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Per-session monotonic message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    /// Unix timestamp (milliseconds) when the message was appended.
    pub timestamp_ms: i64,
}

impl Message {
    pub(crate) fn now(id: MessageId, sender: Sender, text: String) -> Self {
        let timestamp_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            id,
            text,
            sender,
            timestamp_ms,
        }
    }
}

/// Result of [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// User message appended; a reply is scheduled.
    Accepted(Message),
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// Session already closed; nothing happened.
    Closed,
}

/// Change notifications for chat surfaces that render incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Message { message: Message },
    Typing { pending: bool },
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Simulated typing latency before each reply is appended.
    pub reply_delay: Duration,
    /// Sessions untouched this long are closed by [`SessionManager::close_idle`].
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
            idle_timeout: Some(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS)),
        }
    }
}

impl From<&CoreConfig> for SessionConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            reply_delay: config.reply_delay(),
            idle_timeout: config.session_idle_timeout(),
        }
    }
}
