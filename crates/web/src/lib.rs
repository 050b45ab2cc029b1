//! AgentBI web server library.
//!
//! This crate provides the server as a library, allowing the router to be
//! driven directly in tests and the webhook signer to be reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
pub mod webhooks;

pub use routes::app;
pub use state::AppState;
