//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Readiness (pings the store)
//!
//! # Webhooks (public, signature-verified)
//! POST   /api/webhooks                         - Identity-provider events
//!
//! # Tab sessions (identity required)
//! POST   /api/tabs[?replaces={tab}]            - Open a fresh tab session
//! GET    /api/tabs/{tab}/files                 - Staged files
//!
//! # Upload intake
//! POST   /api/tabs/{tab}/upload/drag           - Drag over / leave
//! POST   /api/tabs/{tab}/upload/drop           - Drop files (multipart)
//! POST   /api/tabs/{tab}/upload/files          - Picker selection (multipart)
//! DELETE /api/tabs/{tab}/upload/files/{index}  - Remove one file
//! POST   /api/tabs/{tab}/upload/confirm        - Continue to chat
//!
//! # Chat
//! GET    /api/tabs/{tab}/chat                  - Chat snapshot
//! PUT    /api/tabs/{tab}/chat/input            - Edit draft
//! POST   /api/tabs/{tab}/chat/send             - Send draft
//! POST   /api/tabs/{tab}/chat/key              - Key press
//! POST   /api/tabs/{tab}/chat/files            - Add files (multipart)
//! POST   /api/tabs/{tab}/chat/theme            - Toggle theme
//! ```
//!
//! Routes that carry files get their own body limit
//! ([`crate::config::TabSessionConfig::max_upload_bytes`]).

pub mod chat;
pub mod tabs;
pub mod upload;
pub mod webhooks;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{identity_gate, make_request_span, request_id_middleware, session_provider};
use crate::session::SessionRegistry;
use crate::state::AppState;

/// Routes for a single tab session, nested under `/api/tabs/{tab}`.
pub fn tab_routes(max_upload_bytes: usize) -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(max_upload_bytes);

    Router::new()
        .route("/files", get(tabs::files))
        .route("/upload/drag", post(upload::drag))
        .route("/upload/drop", post(upload::drop_files).layer(upload_limit))
        .route("/upload/files", post(upload::select_files).layer(upload_limit))
        .route("/upload/files/{index}", delete(upload::remove_file))
        .route("/upload/confirm", post(upload::confirm))
        .route("/chat", get(chat::show))
        .route("/chat/input", put(chat::set_input))
        .route("/chat/send", post(chat::send))
        .route("/chat/key", post(chat::key_down))
        .route("/chat/files", post(chat::select_files).layer(upload_limit))
        .route("/chat/theme", post(chat::toggle_theme))
}

/// Create all application routes, without middleware.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/webhooks", post(webhooks::receive))
        .route("/api/tabs", post(tabs::open))
        .nest("/api/tabs/{tab}", tab_routes(max_upload_bytes))
        .fallback(not_found)
}

/// The complete application: routes, identity gate and session provider.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState, registry: SessionRegistry) -> Router {
    routes(registry.max_upload_bytes())
        .layer(from_fn_with_state(state.clone(), identity_gate))
        .layer(session_provider(registry))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the account store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.accounts().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
