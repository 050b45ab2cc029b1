//! Per-tab shared session state.
//!
//! Each browser tab owns one [`TabSession`] holding the staged file set and
//! the two views that read and write it. The file set lives in a
//! [`FileContext`]; views never own it, they borrow it for the duration of a
//! single operation.

pub mod registry;

pub use registry::{SessionRegistry, TabId, TabSession};

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use thiserror::Error;

use agentbi_core::{AllowedType, StagedFile};

/// Session lookup failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No live tab session with this ID belongs to the caller.
    #[error("tab session not found: {0}")]
    NotFound(String),

    /// A handler ran without the session registry installed.
    #[error("must be used within a session provider")]
    MissingProvider,
}

/// An update to the staged file set.
pub enum FilesUpdate {
    /// Replace the whole set.
    Replace(Vec<StagedFile>),
    /// Compute the next set from the current one.
    Apply(Box<dyn FnOnce(Vec<StagedFile>) -> Vec<StagedFile> + Send>),
}

impl FilesUpdate {
    /// Build a functional update.
    pub fn apply<F>(f: F) -> Self
    where
        F: FnOnce(Vec<StagedFile>) -> Vec<StagedFile> + Send + 'static,
    {
        Self::Apply(Box::new(f))
    }

    fn run(self, current: Vec<StagedFile>) -> Vec<StagedFile> {
        match self {
            Self::Replace(files) => files,
            Self::Apply(f) => f(current),
        }
    }
}

impl From<Vec<StagedFile>> for FilesUpdate {
    fn from(files: Vec<StagedFile>) -> Self {
        Self::Replace(files)
    }
}

impl std::fmt::Debug for FilesUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace(files) => f.debug_tuple("Replace").field(&files.len()).finish(),
            Self::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// The staged file set of one tab session.
///
/// Reads return a snapshot. Writes run as one transition under the write
/// lock, so a functional update always sees the latest prior state.
#[derive(Debug, Default)]
pub struct FileContext {
    files: RwLock<Vec<StagedFile>>,
}

impl FileContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current files, in insertion order.
    #[must_use]
    pub fn files(&self) -> Vec<StagedFile> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply an update to the file set.
    pub fn set_files(&self, update: impl Into<FilesUpdate>) {
        let mut guard = self.files.write().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *guard);
        *guard = update.into().run(current);
    }

    /// Describe the current files without their content.
    #[must_use]
    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .enumerate()
            .map(|(index, file)| FileSummary::new(index, file))
            .collect()
    }
}

/// A staged file as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub index: usize,
    pub name: String,
    pub mime: AllowedType,
    pub size: usize,
}

impl FileSummary {
    fn new(index: usize, file: &StagedFile) -> Self {
        Self {
            index,
            name: file.name().to_owned(),
            mime: file.mime(),
            size: file.size(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file(name: &str) -> StagedFile {
        StagedFile::accept(name, "text/plain", name.as_bytes().to_vec()).unwrap()
    }

    fn names(ctx: &FileContext) -> Vec<String> {
        ctx.files().iter().map(|f| f.name().to_owned()).collect()
    }

    #[test]
    fn test_starts_empty() {
        let ctx = FileContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.files().is_empty());
    }

    #[test]
    fn test_replace() {
        let ctx = FileContext::new();
        ctx.set_files(vec![file("a.txt")]);
        ctx.set_files(vec![file("b.txt"), file("c.txt")]);
        assert_eq!(names(&ctx), ["b.txt", "c.txt"]);
    }

    #[test]
    fn test_functional_updates_see_latest_state() {
        let ctx = FileContext::new();
        for name in ["a.txt", "b.txt", "c.txt"] {
            let f = file(name);
            ctx.set_files(FilesUpdate::apply(move |mut files| {
                files.push(f);
                files
            }));
        }
        assert_eq!(names(&ctx), ["a.txt", "b.txt", "c.txt"]);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let ctx = std::sync::Arc::new(FileContext::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    let f = file(&format!("{i}.txt"));
                    ctx.set_files(FilesUpdate::apply(move |mut files| {
                        files.push(f);
                        files
                    }));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ctx.len(), 8);
    }

    #[test]
    fn test_summaries_omit_content() {
        let ctx = FileContext::new();
        ctx.set_files(vec![file("notes.txt")]);

        let summaries = ctx.summaries();
        assert_eq!(
            summaries,
            vec![FileSummary {
                index: 0,
                name: "notes.txt".to_string(),
                mime: AllowedType::PlainText,
                size: 9,
            }]
        );
        let json = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(json["mime"], "text/plain");
        assert!(json.get("content").is_none());
    }
}
