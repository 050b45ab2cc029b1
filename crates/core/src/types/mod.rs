//! Core types for AgentBI.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the server and tooling.

pub mod account;
pub mod chat;
pub mod id;
pub mod upload;

pub use account::AccountRecord;
pub use chat::{ChatMessage, Role, Theme};
pub use id::*;
pub use upload::{ACCEPT_ATTRIBUTE, AllowedType, StagedFile, UnsupportedType};
