//! Chat screen.
//!
//! Sending needs at least one staged file. Without one the view raises a
//! warning and keeps the draft so nothing typed is lost.

use serde::{Deserialize, Serialize};

use agentbi_core::{ChatMessage, Theme};

use super::CandidateFile;
use super::upload::append;
use crate::session::{FileContext, FileSummary};

/// Shown when a send is attempted with no staged files.
pub const WARNING_TEXT: &str = "Click on '+' to upload a file in your library.";

/// A key press in the chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Key {
    Enter,
    #[serde(other)]
    Other,
}

/// Result of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// A message was appended and the input cleared.
    Sent,
    /// The input was blank; nothing happened.
    Blank,
    /// No staged files; the warning is shown and the input kept.
    NoFiles,
}

/// Presentation state of the chat screen.
#[derive(Debug, Default, Clone)]
pub struct ChatView {
    messages: Vec<ChatMessage>,
    input: String,
    warning: bool,
    theme: Theme,
}

/// What the client renders for the chat screen.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub warning: Option<&'static str>,
    pub theme: Theme,
    pub files: Vec<FileSummary>,
}

impl ChatView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub const fn warning(&self) -> bool {
        self.warning
    }

    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Try to send the current input.
    pub fn send(&mut self, files: &FileContext) -> SendOutcome {
        if self.input.trim().is_empty() {
            return SendOutcome::Blank;
        }

        if files.is_empty() {
            self.warning = true;
            return SendOutcome::NoFiles;
        }

        let Some(message) = ChatMessage::user(self.messages.len(), &self.input) else {
            return SendOutcome::Blank;
        };
        self.messages.push(message);
        self.input.clear();
        SendOutcome::Sent
    }

    /// Handle a key press. Only Enter does anything: it sends.
    pub fn key_down(&mut self, files: &FileContext, key: Key) -> Option<SendOutcome> {
        match key {
            Key::Enter => Some(self.send(files)),
            Key::Other => None,
        }
    }

    /// Stage files from the chat screen's picker.
    ///
    /// Accepting at least one file clears the warning.
    pub fn select_files(&mut self, files: &FileContext, candidates: Vec<CandidateFile>) -> usize {
        let accepted = append(files, candidates);
        if accepted > 0 {
            self.warning = false;
        }
        accepted
    }

    pub const fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    #[must_use]
    pub fn snapshot(&self, files: &FileContext) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.messages.clone(),
            input: self.input.clone(),
            warning: self.warning.then_some(WARNING_TEXT),
            theme: self.theme,
            files: files.summaries(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agentbi_core::Role;

    use super::*;

    fn with_file() -> FileContext {
        let files = FileContext::new();
        append(
            &files,
            vec![CandidateFile::new("q3.csv", "text/csv", "a,b\n1,2\n")],
        );
        files
    }

    #[test]
    fn test_send_without_files_warns_and_keeps_input() {
        let files = FileContext::new();
        let mut chat = ChatView::new();
        chat.set_input("What changed in Q3?");

        assert_eq!(chat.send(&files), SendOutcome::NoFiles);
        assert!(chat.warning());
        assert_eq!(chat.input(), "What changed in Q3?");
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_send_with_files_appends_trimmed_message() {
        let files = with_file();
        let mut chat = ChatView::new();
        chat.set_input("  Hello  ");

        assert_eq!(chat.send(&files), SendOutcome::Sent);
        assert_eq!(chat.messages().len(), 1);
        let msg = &chat.messages()[0];
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(chat.input(), "");
    }

    #[test]
    fn test_blank_input_is_noop() {
        let files = FileContext::new();
        let mut chat = ChatView::new();
        chat.set_input("   ");

        assert_eq!(chat.send(&files), SendOutcome::Blank);
        assert!(!chat.warning());
        assert_eq!(chat.input(), "   ");
    }

    #[test]
    fn test_enter_is_send() {
        let files = with_file();
        let mut chat = ChatView::new();
        chat.set_input("Hi");

        assert_eq!(chat.key_down(&files, Key::Other), None);
        assert_eq!(chat.input(), "Hi");
        assert_eq!(
            chat.key_down(&files, Key::Enter),
            Some(SendOutcome::Sent)
        );
        assert_eq!(chat.messages()[0].content, "Hi");
    }

    #[test]
    fn test_positions_increase() {
        let files = with_file();
        let mut chat = ChatView::new();
        for text in ["one", "two"] {
            chat.set_input(text);
            chat.send(&files);
        }
        let positions: Vec<_> = chat.messages().iter().map(|m| m.position).collect();
        assert_eq!(positions, [0, 1]);
    }

    #[test]
    fn test_selecting_files_clears_warning() {
        let files = FileContext::new();
        let mut chat = ChatView::new();
        chat.set_input("Hello");
        chat.send(&files);
        assert!(chat.warning());

        // rejected types do not clear it
        chat.select_files(&files, vec![CandidateFile::new("a.png", "image/png", "x")]);
        assert!(chat.warning());

        chat.select_files(&files, vec![CandidateFile::new("a.pdf", "application/pdf", "x")]);
        assert!(!chat.warning());
        assert_eq!(chat.send(&files), SendOutcome::Sent);
    }

    #[test]
    fn test_toggle_theme_leaves_data_alone() {
        let files = with_file();
        let mut chat = ChatView::new();
        chat.set_input("draft");

        assert_eq!(chat.toggle_theme(), Theme::Light);
        assert_eq!(chat.toggle_theme(), Theme::Dark);
        assert_eq!(chat.input(), "draft");
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_key_deserializes_unknown_as_other() {
        assert_eq!(serde_json::from_str::<Key>("\"Enter\"").unwrap(), Key::Enter);
        assert_eq!(serde_json::from_str::<Key>("\"a\"").unwrap(), Key::Other);
    }

    #[test]
    fn test_snapshot_shows_warning_text() {
        let files = FileContext::new();
        let mut chat = ChatView::new();
        chat.set_input("x");
        chat.send(&files);

        let snapshot = chat.snapshot(&files);
        assert_eq!(snapshot.warning, Some(WARNING_TEXT));
        assert!(snapshot.files.is_empty());
    }
}
