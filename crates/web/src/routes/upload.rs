//! Upload intake routes.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::extract::{ApiJson, ApiPath, Files};
use crate::middleware::Tab;
use crate::session::{FileSummary, TabSession};
use crate::views::Navigation;

#[derive(Debug, Deserialize)]
pub struct DragRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct FilePath {
    pub index: usize,
}

/// Upload screen state after an operation.
#[derive(Debug, Serialize)]
pub struct UploadState {
    pub dragging: bool,
    pub files: Vec<FileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<usize>,
}

impl UploadState {
    fn of(session: &TabSession, dragging: bool, accepted: Option<usize>) -> Self {
        Self {
            dragging,
            files: session.files.summaries(),
            accepted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NextScreen {
    pub next: Navigation,
}

/// `POST /api/tabs/{tab}/upload/drag`
#[instrument(skip_all, fields(tab_id = %tab.id, active = body.active))]
pub async fn drag(tab: Tab, ApiJson(body): ApiJson<DragRequest>) -> Json<UploadState> {
    let mut view = tab.session.upload();
    if body.active {
        view.drag_over();
    } else {
        view.drag_leave();
    }
    Json(UploadState::of(&tab.session, view.dragging, None))
}

/// `POST /api/tabs/{tab}/upload/drop`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn drop_files(tab: Tab, Files(candidates): Files) -> Json<UploadState> {
    let offered = candidates.len();

    let mut view = tab.session.upload();
    let accepted = view.drop_files(&tab.session.files, candidates);
    info!(offered, accepted, "Files dropped");
    Json(UploadState::of(&tab.session, view.dragging, Some(accepted)))
}

/// `POST /api/tabs/{tab}/upload/files`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn select_files(tab: Tab, Files(candidates): Files) -> Json<UploadState> {
    let offered = candidates.len();

    let mut view = tab.session.upload();
    let accepted = view.select_files(&tab.session.files, candidates);
    info!(offered, accepted, "Files selected");
    Json(UploadState::of(&tab.session, view.dragging, Some(accepted)))
}

/// `DELETE /api/tabs/{tab}/upload/files/{index}`
#[instrument(skip_all, fields(tab_id = %tab.id, index = path.index))]
pub async fn remove_file(tab: Tab, ApiPath(path): ApiPath<FilePath>) -> Json<UploadState> {
    let mut view = tab.session.upload();
    view.remove_at(&tab.session.files, path.index);
    Json(UploadState::of(&tab.session, view.dragging, None))
}

/// `POST /api/tabs/{tab}/upload/confirm`
#[instrument(skip_all, fields(tab_id = %tab.id))]
pub async fn confirm(tab: Tab) -> Json<NextScreen> {
    let next = tab.session.upload().confirm();
    Json(NextScreen { next })
}
