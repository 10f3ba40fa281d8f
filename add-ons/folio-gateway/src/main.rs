//! Axum-based chat gateway: serves Folio chat sessions to the portfolio widget. Config-driven via CoreConfig.

mod handlers;

use axum::http::Method;
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use folio_core::{
    CoreConfig, KnowledgeBase, ResponseEngine, SessionConfig, SessionManager, TOPIC_ORDER,
};
use handlers::chat;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Knowledge base named by config, or the built-in portfolio when unset or unreadable.
fn load_knowledge(config: &CoreConfig) -> KnowledgeBase {
    let Some(path) = config.knowledge_path() else {
        tracing::info!(target: "folio::gateway", "Using built-in portfolio knowledge base");
        return KnowledgeBase::portfolio();
    };
    match KnowledgeBase::load_json_path(path) {
        Ok(kb) => kb,
        Err(e) => {
            tracing::warn!(
                target: "folio::gateway",
                path = %path.display(),
                error = %e,
                "Knowledge base not loaded; falling back to built-in portfolio"
            );
            KnowledgeBase::portfolio()
        }
    }
}

/// Pre-flight check: config parses, knowledge base loads, port is available.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge base... ");
    let kb = match config.knowledge_path() {
        Some(path) => KnowledgeBase::load_json_path(path)
            .map_err(|e| format!("knowledge base unusable: {}", e))?,
        None => KnowledgeBase::portfolio(),
    };
    println!(
        "OK ({} experience, {} education, {} projects)",
        kb.experience().len(),
        kb.education().len(),
        kb.projects().len()
    );

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nAll checks passed. Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[folio-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(CoreConfig::load()?);
    let knowledge = Arc::new(load_knowledge(&config));
    let state = AppState::new(Arc::clone(&config), knowledge);
    let sessions = Arc::clone(&state.sessions);
    let sweeper = sessions.spawn_idle_sweeper();
    let app = build_app(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!(
        target: "folio::gateway",
        reply_delay_ms = config.reply_delay_ms,
        session_idle_secs = config.session_idle_secs,
        "{} listening on {}",
        config.app_name,
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    sessions.close_all();
    tracing::info!(target: "folio::gateway", "Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "folio::gateway", error = %e, "Ctrl-C handler failed");
        std::future::pending::<()>().await;
    }
}

fn build_app(state: AppState) -> Router {
    // CORS: allow Backend/API (8001-8099) and Frontend/UI (3001-3099) port ranges.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &axum::http::HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            let port = s
                .rsplit(':')
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(0);
            (3001..=3099).contains(&port) || (8001..=8099).contains(&port)
        }))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/v1/status", get(status))
        .route("/api/v1/health", get(health))
        .route("/api/v1/respond", post(chat::respond))
        .route("/api/v1/sessions", post(chat::open_session))
        .route(
            "/api/v1/sessions/:id",
            get(chat::get_session).delete(chat::close_session),
        )
        .route("/api/v1/sessions/:id/messages", post(chat::send_message))
        .route("/api/v1/sessions/:id/events", get(chat::session_events))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) engine: Arc<ResponseEngine>,
    pub(crate) sessions: Arc<SessionManager>,
}

impl AppState {
    fn new(config: Arc<CoreConfig>, knowledge: Arc<KnowledgeBase>) -> Self {
        let engine = Arc::new(ResponseEngine::new(knowledge));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&engine) as Arc<dyn folio_core::Responder>,
            SessionConfig::from(config.as_ref()),
        ));
        Self {
            config,
            engine,
            sessions,
        }
    }
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /v1/status – app identity, chat timing and topic order.
async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "reply_delay_ms": state.config.reply_delay_ms,
        "session_idle_secs": state.config.session_idle_secs,
        "owner": state.engine.knowledge().owner(),
        "open_sessions": state.sessions.len(),
        "topic_order": TOPIC_ORDER,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_config() -> CoreConfig {
        CoreConfig {
            app_name: "Test Gateway".to_string(),
            port: 8001,
            reply_delay_ms: 1000,
            knowledge_path: String::new(),
            session_idle_secs: 60,
        }
    }

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(test_config()),
            Arc::new(KnowledgeBase::portfolio()),
        )
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_app(test_state());
        let (status, json) = call(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_returns_identity_and_topic_order() {
        let state = test_state();
        state.sessions.open();
        let app = build_app(state);
        let (status, json) = call(&app, "GET", "/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["app_name"], "Test Gateway");
        assert_eq!(json["reply_delay_ms"], 1000);
        assert_eq!(json["session_idle_secs"], 60);
        assert_eq!(json["owner"], "Iram");
        assert_eq!(json["open_sessions"], 1);
        assert_eq!(json["topic_order"][0], "experience");
        assert_eq!(json["topic_order"][7], "frontend_focus");
    }

    #[tokio::test]
    async fn test_respond_reports_first_matching_topic() {
        let app = build_app(test_state());
        let (status, json) = call(
            &app,
            "POST",
            "/api/v1/respond",
            Some(serde_json::json!({ "utterance": "education project" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["topic"], "education");
        assert!(json["text"].as_str().unwrap().contains("educational background"));

        let (_, json) = call(
            &app,
            "POST",
            "/api/v1/respond",
            Some(serde_json::json!({ "utterance": "hello there" })),
        )
        .await;
        assert_eq!(json["topic"], "fallback");
    }

    #[tokio::test]
    async fn test_open_session_seeds_greeting() {
        let app = build_app(test_state());
        let (status, json) = call(&app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(json["session_id"].is_string());
        assert_eq!(json["pending_reply"], false);
        let transcript = json["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0]["sender"], "bot");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_then_reply_arrives() {
        let state = test_state();
        let sessions = Arc::clone(&state.sessions);
        let app = build_app(state);

        let (_, opened) = call(&app, "POST", "/api/v1/sessions", None).await;
        let id = opened["session_id"].as_str().unwrap().to_string();

        let (status, json) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/messages", id),
            Some(serde_json::json!({ "text": "skills" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["message"]["sender"], "user");
        assert_eq!(json["message"]["text"], "skills");

        let (_, snapshot) = call(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(snapshot["pending_reply"], true);
        assert_eq!(snapshot["transcript"].as_array().unwrap().len(), 2);

        sessions.get(id.parse().unwrap()).unwrap().settled().await;

        let (_, snapshot) = call(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(snapshot["pending_reply"], false);
        let transcript = snapshot["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2]["sender"], "bot");
        let reply = transcript[2]["text"].as_str().unwrap();
        for label in ["Frontend", "Backend", "Tools"] {
            assert!(reply.contains(label));
        }
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let app = build_app(test_state());
        let (_, opened) = call(&app, "POST", "/api/v1/sessions", None).await;
        let id = opened["session_id"].as_str().unwrap().to_string();

        let (status, json) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/messages", id),
            Some(serde_json::json!({ "text": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ignored");

        let (_, snapshot) = call(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(snapshot["transcript"].as_array().unwrap().len(), 1);
        assert_eq!(snapshot["pending_reply"], false);
    }

    #[tokio::test]
    async fn test_close_session_then_not_found() {
        let app = build_app(test_state());
        let (_, opened) = call(&app, "POST", "/api/v1/sessions", None).await;
        let id = opened["session_id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/sessions/{}", id);

        let (status, json) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "closed");

        let (status, _) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(
            &app,
            "POST",
            &format!("{}/messages", uri),
            Some(serde_json::json!({ "text": "skills" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_session_expires() {
        let state = test_state();
        let sweeper = state.sessions.spawn_idle_sweeper().unwrap();
        let app = build_app(state);
        let (_, opened) = call(&app, "POST", "/api/v1/sessions", None).await;
        let uri = format!("/api/v1/sessions/{}", opened["session_id"].as_str().unwrap());

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        let (status, _) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        let (status, _) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_not_found() {
        let app = build_app(test_state());
        let (status, _) = call(&app, "GET", "/api/v1/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_events_endpoint_streams_sse() {
        let app = build_app(test_state());
        let (_, opened) = call(&app, "POST", "/api/v1/sessions", None).await;
        let id = opened["session_id"].as_str().unwrap().to_string();

        let req = Request::builder()
            .method("GET")
            .uri(format!("/api/v1/sessions/{}/events", id))
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let content_type = res
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert!(content_type.starts_with("text/event-stream"));
    }

    #[test]
    fn test_unreadable_knowledge_path_falls_back_to_portfolio() {
        let config = CoreConfig {
            knowledge_path: "/definitely/missing/knowledge.json".to_string(),
            ..test_config()
        };
        assert_eq!(load_knowledge(&config), KnowledgeBase::portfolio());
    }
}
