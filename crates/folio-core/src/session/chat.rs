//! A single chat session and its scheduled replies.

use super::{Message, MessageId, SendOutcome, Sender, SessionConfig, SessionEvent, SessionId};
use crate::engine::Responder;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

struct Transcript {
    messages: Vec<Message>,
    closed: bool,
    last_active: Instant,
}

/// How an append changes the in-flight reply count.
#[derive(Clone, Copy)]
enum Pending {
    Unchanged,
    Start,
    Finish,
}

/// One open chat surface. Always handled through an `Arc`.
///
/// Reply tasks hold only a `Weak` handle and a clone of the session's cancellation
/// token, and re-check `closed` under the transcript lock before appending, so
/// nothing is appended once [`ChatSession::close`] has returned. The in-flight
/// count and typing events change under that same lock, so a send racing a
/// close either schedules before the close (and is reset by it) or sees it.
pub struct ChatSession {
    id: SessionId,
    responder: Arc<dyn Responder>,
    reply_delay: Duration,
    transcript: Mutex<Transcript>,
    next_message_id: AtomicU64,
    /// Number of replies scheduled but not yet delivered.
    in_flight: watch::Sender<usize>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
    runtime: Handle,
}

impl ChatSession {
    /// Creates a session seeded with the responder's greeting.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime. Reply tasks are spawned on
    /// the runtime captured here, so later sends may come from any thread.
    pub fn open(responder: Arc<dyn Responder>, config: SessionConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (in_flight, _) = watch::channel(0);
        let session = Arc::new(Self {
            id: SessionId::new(),
            responder,
            reply_delay: config.reply_delay,
            transcript: Mutex::new(Transcript {
                messages: Vec::new(),
                closed: false,
                last_active: Instant::now(),
            }),
            next_message_id: AtomicU64::new(1),
            in_flight,
            events,
            cancel: CancellationToken::new(),
            runtime: Handle::current(),
        });
        let greeting = session.responder.greeting();
        session.append(Sender::Bot, greeting, Pending::Unchanged);
        tracing::info!(target: "folio::session", session_id = %session.id, "Session opened");
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Appends the user's message now and schedules the bot reply.
    ///
    /// Input that is empty after trimming is ignored: nothing is appended and the
    /// responder is not called. The text is stored as given.
    pub fn send(self: &Arc<Self>, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(message) = self.append(Sender::User, text.to_string(), Pending::Start) else {
            return SendOutcome::Closed;
        };
        tracing::debug!(
            target: "folio::session",
            session_id = %self.id,
            message_id = %message.id,
            "User message appended, reply scheduled"
        );
        self.schedule_reply(text.to_string());
        SendOutcome::Accepted(message)
    }

    /// Closes the session. Pending replies are suppressed. Returns false if already closed.
    pub fn close(&self) -> bool {
        let was_open = {
            let mut transcript = self.lock();
            let was_open = !std::mem::replace(&mut transcript.closed, true);
            if was_open {
                self.in_flight.send_replace(0);
                let _ = self.events.send(SessionEvent::Closed);
            }
            was_open
        };
        self.cancel.cancel();
        if was_open {
            tracing::info!(target: "folio::session", session_id = %self.id, "Session closed");
        }
        was_open
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// True while at least one reply is scheduled but not delivered.
    pub fn pending_reply(&self) -> bool {
        *self.in_flight.borrow() > 0
    }

    /// Snapshot of the transcript in append order.
    pub fn transcript(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    /// Never true for a freshly opened session (it holds the greeting).
    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    /// Time since the last append or [`ChatSession::touch`].
    pub fn idle_for(&self) -> Duration {
        self.lock().last_active.elapsed()
    }

    /// Marks the session active without changing the transcript.
    pub fn touch(&self) {
        self.lock().last_active = Instant::now();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Resolves once no reply is in flight (immediately if none, or after close).
    pub async fn settled(&self) {
        let mut rx = self.in_flight.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends and adjusts the in-flight count under the transcript lock; `None` once closed.
    fn append(&self, sender: Sender, text: String, pending: Pending) -> Option<Message> {
        let mut transcript = self.lock();
        if transcript.closed {
            return None;
        }
        let id = MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed));
        let message = Message::now(id, sender, text);
        transcript.messages.push(message.clone());
        transcript.last_active = Instant::now();
        let _ = self.events.send(SessionEvent::Message {
            message: message.clone(),
        });
        match pending {
            Pending::Unchanged => {}
            Pending::Start => {
                self.in_flight.send_modify(|n| *n += 1);
                let _ = self.events.send(SessionEvent::Typing { pending: true });
            }
            Pending::Finish => {
                let mut remaining = 0;
                self.in_flight.send_modify(|n| {
                    *n = n.saturating_sub(1);
                    remaining = *n;
                });
                let _ = self.events.send(SessionEvent::Typing {
                    pending: remaining > 0,
                });
            }
        }
        Some(message)
    }

    fn schedule_reply(self: &Arc<Self>, utterance: String) {
        let session = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let delay = self.reply_delay;
        let session_id = self.id;
        self.runtime.spawn(async move {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::trace!(target: "folio::session", %session_id, "Reply dropped: session closed");
                }

                () = tokio::time::sleep(delay) => {
                    deliver_reply(session, &utterance, session_id);
                }
            }
        });
    }
}

fn deliver_reply(session: Weak<ChatSession>, utterance: &str, session_id: SessionId) {
    let Some(session) = session.upgrade() else {
        tracing::trace!(target: "folio::session", %session_id, "Reply dropped: session gone");
        return;
    };
    if session.cancel.is_cancelled() {
        tracing::trace!(target: "folio::session", %session_id, "Reply dropped: session closed");
        return;
    }
    let reply = session.responder.respond(utterance);
    match session.append(Sender::Bot, reply.text, Pending::Finish) {
        Some(message) => {
            tracing::debug!(
                target: "folio::session",
                %session_id,
                message_id = %message.id,
                topic = ?reply.topic,
                "Bot reply appended"
            );
        }
        None => {
            tracing::trace!(target: "folio::session", %session_id, "Reply dropped: session closed");
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("reply_delay", &self.reply_delay)
            .field("pending_reply", &self.pending_reply())
            .finish_non_exhaustive()
    }
}
