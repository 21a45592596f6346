//! REST API server for the dialog orchestrator
//!
//! Exposes `process_turn` over HTTP and owns the session-id → context map.
//! One mutex per session serializes turns on that context, which is the
//! host half of the engine's concurrency contract; turns on different
//! sessions run freely in parallel.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::context::DialogContext;
use crate::engine::DialogEngine;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Opaque client session handle; hashed to a stable UUID. Omitted on
    /// the first message, a fresh session is created.
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub reply: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    engine: Arc<DialogEngine>,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<DialogContext>>>>>,
}

impl ApiState {
    pub fn new(engine: Arc<DialogEngine>) -> Self {
        Self {
            engine,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Maps the client's session handle to a UUID: parsed when it already
    /// is one, hashed to a stable UUID otherwise, fresh when absent.
    pub fn resolve_session_id(&self, raw: Option<&str>) -> Uuid {
        match raw {
            Some(value) if !value.trim().is_empty() => Uuid::parse_str(value)
                .unwrap_or_else(|_| stable_uuid_from_string(value)),
            _ => Uuid::new_v4(),
        }
    }

    /// Existing context for the session, or a new one at the start state.
    pub async fn session_context(&self, session_id: Uuid) -> Arc<Mutex<DialogContext>> {
        if let Some(existing) = self.sessions.read().await.get(&session_id) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(session_id).or_insert_with(|| {
            Arc::new(Mutex::new(self.engine.start_session_with_id(session_id)))
        }))
    }
}

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn chat(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = state.resolve_session_id(req.session_id.as_deref());
    info!(%session_id, "Received chat message");

    let session = state.session_context(session_id).await;
    let mut context = session.lock().await;

    match state.engine.process_turn(&req.message, &mut context).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ApiResponse::success(ChatReply {
                session_id,
                reply,
                state: context.current_state.clone(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Turn processing failed: {}", e))),
        ),
    }
}

/// =============================
/// Server
/// =============================

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(engine: Arc<DialogEngine>, port: u16) -> crate::Result<()> {
    let state = ApiState::new(engine);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(%port, "Dialog API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
