//! AgentBI Core - Shared domain types.
//!
//! This crate provides the types used across AgentBI components:
//! - `web` - HTTP server (webhooks, identity gate, tab sessions)
//! - `cli` - Command-line tools for migrations and local webhook signing
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, staged uploads, chat messages and account records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
