//! CLI command implementations.

pub mod migrate;
pub mod sign_webhook;
