//! Upload intake screen: drag-and-drop zone, file picker and staged list.

use serde::Serialize;

use super::{CandidateFile, stage};
use crate::session::{FileContext, FilesUpdate};

/// Where the client should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    Chat,
}

/// Presentation state of the upload screen.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct UploadIntake {
    /// A drag is hovering over the drop zone. Visual only.
    pub dragging: bool,
}

impl UploadIntake {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn drag_over(&mut self) {
        self.dragging = true;
    }

    pub const fn drag_leave(&mut self) {
        self.dragging = false;
    }

    /// Stage dropped files and end the drag. Returns how many were accepted.
    pub fn drop_files(&mut self, files: &FileContext, candidates: Vec<CandidateFile>) -> usize {
        self.dragging = false;
        append(files, candidates)
    }

    /// Stage files chosen in the picker. Returns how many were accepted.
    pub fn select_files(&mut self, files: &FileContext, candidates: Vec<CandidateFile>) -> usize {
        append(files, candidates)
    }

    /// Remove the file at `index`. Out-of-range indices leave the set alone.
    pub fn remove_at(&mut self, files: &FileContext, index: usize) {
        files.set_files(FilesUpdate::apply(move |mut current| {
            if index < current.len() {
                current.remove(index);
            }
            current
        }));
    }

    /// Move on to chat. Nothing is validated; an empty set is allowed.
    #[must_use]
    pub const fn confirm(&self) -> Navigation {
        Navigation::Chat
    }

    #[must_use]
    pub const fn cancel(&self) -> Navigation {
        Navigation::Chat
    }
}

/// Append the allow-listed candidates to the set, keeping what is there.
pub(crate) fn append(files: &FileContext, candidates: Vec<CandidateFile>) -> usize {
    let accepted = stage(candidates);
    let count = accepted.len();
    if count > 0 {
        files.set_files(FilesUpdate::apply(move |mut current| {
            current.extend(accepted);
            current
        }));
    }
    count
}
