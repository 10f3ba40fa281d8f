//! Registry of open chat sessions, addressed by [`SessionId`].

use super::{ChatSession, Message, SendOutcome, SessionConfig, SessionError, SessionId};
use crate::engine::Responder;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Upper bound on the gap between idle sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Opens, routes to, and closes independent chat sessions.
///
/// Sessions share only the responder (and through it the read-only knowledge
/// base); each has its own transcript and reply tasks.
pub struct SessionManager {
    responder: Arc<dyn Responder>,
    config: SessionConfig,
    sessions: DashMap<SessionId, Arc<ChatSession>>,
}

impl SessionManager {
    pub fn new(responder: Arc<dyn Responder>, config: SessionConfig) -> Self {
        Self {
            responder,
            config,
            sessions: DashMap::new(),
        }
    }

    /// Opens a session seeded with the greeting and registers it.
    ///
    /// Must be called inside a Tokio runtime (see [`ChatSession::open`]).
    pub fn open(&self) -> Arc<ChatSession> {
        let session = ChatSession::open(Arc::clone(&self.responder), self.config);
        self.sessions.insert(session.id(), Arc::clone(&session));
        session
    }

    /// Looks up a session and marks it active.
    pub fn get(&self, id: SessionId) -> Result<Arc<ChatSession>, SessionError> {
        let session = self
            .sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SessionError::NotFound(id))?;
        session.touch();
        Ok(session)
    }

    pub fn send(&self, id: SessionId, text: &str) -> Result<SendOutcome, SessionError> {
        Ok(self.get(id)?.send(text))
    }

    pub fn transcript(&self, id: SessionId) -> Result<Vec<Message>, SessionError> {
        Ok(self.get(id)?.transcript())
    }

    /// Closes and unregisters the session; its pending replies never land.
    pub fn close(&self, id: SessionId) -> Result<(), SessionError> {
        let (_, session) = self
            .sessions
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        session.close();
        Ok(())
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Closes and unregisters sessions idle for at least the configured timeout.
    /// Sessions with a reply in flight are kept. Returns how many were closed.
    pub fn close_idle(&self) -> usize {
        let Some(limit) = self.config.idle_timeout else {
            return 0;
        };
        let expired = |session: &Arc<ChatSession>| {
            !session.pending_reply() && session.idle_for() >= limit
        };
        let candidates: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| expired(entry.value()))
            .map(|entry| *entry.key())
            .collect();

        let mut closed = 0;
        for id in candidates {
            // Re-checked under the shard lock: a lookup since the scan keeps it.
            if let Some((_, session)) = self.sessions.remove_if(&id, |_, s| expired(s)) {
                session.close();
                closed += 1;
            }
        }
        if closed > 0 {
            tracing::info!(
                target: "folio::session",
                closed,
                remaining = self.sessions.len(),
                "Idle sessions expired"
            );
        }
        closed
    }

    /// Spawns a task that runs [`SessionManager::close_idle`] periodically.
    ///
    /// Returns `None` when idle expiry is disabled. The task ends once the
    /// manager is dropped, or when the returned handle is aborted.
    pub fn spawn_idle_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let limit = self.config.idle_timeout?;
        let period = limit.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        let manager = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.close_idle();
            }
        }))
    }

    /// Closes every open session (e.g. on shutdown).
    pub fn close_all(&self) {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| *e.key()).collect();
        for id in ids {
            let _ = self.close(id);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("open_sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
