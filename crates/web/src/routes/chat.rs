//! Chat screen routes.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use agentbi_core::Theme;

use crate::extract::{ApiJson, Files};
use crate::middleware::Tab;
use crate::views::{ChatSnapshot, Key, SendOutcome};

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub key: Key,
}

/// Chat screen state, with the result of the operation that produced it.
#[derive(Debug, Serialize)]
pub struct ChatUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SendOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<usize>,
    #[serde(flatten)]
    pub chat: ChatSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ThemeState {
    pub theme: Theme,
}

/// `GET /api/tabs/{tab}/chat`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn show(tab: Tab) -> Json<ChatSnapshot> {
    Json(tab.session.chat().snapshot(&tab.session.files))
}

/// `PUT /api/tabs/{tab}/chat/input`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn set_input(tab: Tab, ApiJson(body): ApiJson<InputRequest>) -> Json<ChatSnapshot> {
    let mut chat = tab.session.chat();
    chat.set_input(body.text);
    Json(chat.snapshot(&tab.session.files))
}

/// `POST /api/tabs/{tab}/chat/send`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn send(tab: Tab) -> Json<ChatUpdate> {
    let mut chat = tab.session.chat();
    let outcome = chat.send(&tab.session.files);
    debug!(?outcome, "Chat send");
    Json(ChatUpdate {
        outcome: Some(outcome),
        accepted: None,
        chat: chat.snapshot(&tab.session.files),
    })
}

/// `POST /api/tabs/{tab}/chat/key`
#[instrument(skip_all, fields(tab_id = %tab.id, key = ?body.key))]
pub async fn key_down(tab: Tab, ApiJson(body): ApiJson<KeyRequest>) -> Json<ChatUpdate> {
    let mut chat = tab.session.chat();
    let outcome = chat.key_down(&tab.session.files, body.key);
    Json(ChatUpdate {
        outcome,
        accepted: None,
        chat: chat.snapshot(&tab.session.files),
    })
}

/// `POST /api/tabs/{tab}/chat/files`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn select_files(tab: Tab, Files(candidates): Files) -> Json<ChatUpdate> {
    let mut chat = tab.session.chat();
    let accepted = chat.select_files(&tab.session.files, candidates);
    Json(ChatUpdate {
        outcome: None,
        accepted: Some(accepted),
        chat: chat.snapshot(&tab.session.files),
    })
}

/// `POST /api/tabs/{tab}/chat/theme`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn toggle_theme(tab: Tab) -> Json<ThemeState> {
    let theme = tab.session.chat().toggle_theme();
    Json(ThemeState { theme })
}
