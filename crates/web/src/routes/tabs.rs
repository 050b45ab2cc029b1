//! Tab session lifecycle and shared file listing.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agentbi_core::ACCEPT_ATTRIBUTE;

use crate::extract::ApiQuery;
use crate::middleware::{RequireIdentity, Sessions, Tab};
use crate::session::{FileSummary, TabId};

#[derive(Debug, Default, Deserialize)]
pub struct OpenParams {
    /// Tab this page load replaces, if the client still holds one.
    pub replaces: Option<TabId>,
}

#[derive(Debug, Serialize)]
pub struct OpenedTab {
    pub tab_id: TabId,
    /// File picker accept filter.
    pub accept: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<FileSummary>,
}

/// `POST /api/tabs[?replaces={tab}]`
///
/// Called on every page load. Each call starts an empty session and drops
/// the one it replaces; tabs nobody names are left to expire.
#[instrument(skip_all, fields(user_id = %identity.user_id, replaces = ?params.replaces))]
pub async fn open(
    Sessions(registry): Sessions,
    RequireIdentity(identity): RequireIdentity,
    ApiQuery(params): ApiQuery<OpenParams>,
) -> (StatusCode, Json<OpenedTab>) {
    let (tab_id, _) = registry.open(identity.user_id, params.replaces);
    (
        StatusCode::CREATED,
        Json(OpenedTab {
            tab_id,
            accept: ACCEPT_ATTRIBUTE,
        }),
    )
}

/// `GET /api/tabs/{tab}/files`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn files(tab: Tab) -> Json<FileList> {
    Json(FileList {
        files: tab.session.files.summaries(),
    })
}
