//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record `x-request-id`)
//! 4. Session provider (tab session registry)
//! 5. Identity gate (verify session token, reject anonymous protected requests)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{RequireIdentity, identity_gate};
pub use request_id::{REQUEST_ID_HEADER, make_request_span, request_id_middleware};
pub use session::{Sessions, Tab, session_provider};
