//! Identity gate middleware and extractors.
//!
//! [`identity_gate`] runs on every request. It verifies any session token
//! present, attaches the resulting [`Identity`] to request extensions, and
//! turns away anonymous requests to protected paths.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{Span, debug};

use crate::error::{AppError, set_sentry_user};
use crate::identity::{Identity, policy::Denial, session_token};
use crate::state::AppState;

/// Verify the caller and enforce the gate policy.
///
/// Public paths pass with whatever identity happens to verify. Protected
/// paths require one; without it the request never reaches a handler.
pub async fn identity_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = session_token(request.headers()).and_then(|token| {
        state
            .identity()
            .verify(token)
            .map_err(|e| debug!(error = %e, "Session token rejected"))
            .ok()
    });

    if let Some(identity) = identity {
        Span::current().record("user_id", identity.user_id.as_str());
        set_sentry_user(&identity.user_id);
        request.extensions_mut().insert(identity);
        return next.run(request).await;
    }

    let path = request.uri().path();
    if state.gate().is_public(path) {
        return next.run(request).await;
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or(path, |pq| pq.as_str());

    match state.gate().denial(request.method(), path_and_query) {
        Denial::RedirectToSignIn { return_to } => {
            debug!(path = %return_to, "Anonymous page request, redirecting to sign in");
            Redirect::to(&state.gate().sign_in_redirect(&return_to)).into_response()
        }
        Denial::Unauthorized => AppError::Unauthorized.into_response(),
    }
}

/// Extractor that requires a verified identity.
///
/// Behind [`identity_gate`] this only fails on public paths.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireIdentity(identity): RequireIdentity) -> String {
///     identity.user_id.to_string()
/// }
/// ```
pub struct RequireIdentity(pub Identity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}
