//! Chat handlers: thin adapters from HTTP to `SessionManager` and `ResponseEngine`.
//!
//! Sessions live in the gateway's `SessionManager`; the widget opens one when it
//! is shown and deletes it when it is dismissed. Replies arrive after the
//! configured typing delay, so clients either poll the session or follow its
//! event stream.

use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use folio_core::{ChatSession, Message, Reply, SendOutcome, SessionError, SessionEvent, SessionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Serialize)]
pub(crate) struct SessionView {
    pub(crate) session_id: SessionId,
    pub(crate) pending_reply: bool,
    pub(crate) transcript: Vec<Message>,
}

impl SessionView {
    fn of(session: &ChatSession) -> Self {
        Self {
            session_id: session.id(),
            pending_reply: session.pending_reply(),
            transcript: session.transcript(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct SendRequest {
    text: String,
}

#[derive(Deserialize)]
pub(crate) struct RespondRequest {
    utterance: String,
}

/// Unknown or malformed ids both map to 404.
fn lookup(state: &AppState, raw_id: &str) -> Result<Arc<ChatSession>, StatusCode> {
    let id: SessionId = raw_id.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    state.sessions.get(id).map_err(|SessionError::NotFound(_)| StatusCode::NOT_FOUND)
}

/// POST /api/v1/respond – stateless classification with the matched topic.
pub(crate) async fn respond(
    State(state): State<AppState>,
    Json(req): Json<RespondRequest>,
) -> Json<Reply> {
    Json(state.engine.respond(&req.utterance))
}

/// POST /api/v1/sessions – open a session seeded with the greeting.
pub(crate) async fn open_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.open();
    (StatusCode::CREATED, Json(SessionView::of(&session)))
}

/// GET /api/v1/sessions/:id – transcript snapshot.
pub(crate) async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, StatusCode> {
    let session = lookup(&state, &id)?;
    Ok(Json(SessionView::of(&session)))
}

/// POST /api/v1/sessions/:id/messages – append a user turn and schedule the reply.
pub(crate) async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = lookup(&state, &id)?;
    let body = match session.send(&req.text) {
        SendOutcome::Accepted(message) => {
            serde_json::json!({ "status": "accepted", "message": message })
        }
        SendOutcome::Ignored => serde_json::json!({ "status": "ignored" }),
        SendOutcome::Closed => serde_json::json!({ "status": "closed" }),
    };
    Ok(Json(body))
}

/// DELETE /api/v1/sessions/:id – close; a reply still in flight is dropped.
pub(crate) async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id: SessionId = id.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    state
        .sessions
        .close(id)
        .map_err(|SessionError::NotFound(_)| StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({ "status": "closed", "session_id": id })))
}

/// GET /api/v1/sessions/:id/events – Server-Sent Events for transcript changes.
pub(crate) async fn session_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<
    Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>> + Send + 'static>,
    StatusCode,
> {
    use async_stream::stream;
    let session = lookup(&state, &id)?;
    let mut rx = session.subscribe();
    // The stream must not keep the session alive after it is closed.
    drop(session);
    let stream = stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let done = matches!(event, SessionEvent::Closed);
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(Event::default().event(event_name(&event)).data(data));
                    if done {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    yield Ok(Event::default().comment(format!("{} events dropped", n)));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}

fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::Message { .. } => "message",
        SessionEvent::Typing { .. } => "typing",
        SessionEvent::Closed => "closed",
    }
}
