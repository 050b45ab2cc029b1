//! Identity-provider webhook receiver.

use axum::{Json, extract::State, http::HeaderMap};
use bytes::Bytes;
use tracing::{Span, info, instrument};

use crate::error::{AppError, MessageBody, Result};
use crate::state::AppState;
use crate::webhooks::{WebhookEvent, WebhookHeaders};

/// `POST /api/webhooks`
///
/// The body is taken as raw bytes: the signature covers the exact payload,
/// so nothing is parsed until it verifies.
#[instrument(skip_all, fields(svix_id = tracing::field::Empty, event_type = tracing::field::Empty))]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageBody>> {
    let svix = WebhookHeaders::from_headers(&headers)?;
    Span::current().record("svix_id", svix.id);

    let verified = state.webhooks().verify(&svix, &body)?;
    let event = WebhookEvent::from_verified(verified)?;
    Span::current().record("event_type", event.kind());

    match event {
        WebhookEvent::UserCreated(user) => {
            let record = user.to_record();
            let outcome = state
                .accounts()
                .insert_account(&record)
                .await
                .map_err(AppError::Provisioning)?;

            info!(account_id = %record.id, ?outcome, "Account provisioned");
            Ok(Json(MessageBody::new("User data inserted successfully")))
        }
        WebhookEvent::Unhandled { kind } => Err(AppError::UnhandledEvent(kind)),
    }
}
