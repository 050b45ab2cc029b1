//! Staged upload types and the MIME allow-list.
//!
//! A [`StagedFile`] can only be built through [`StagedFile::accept`], which
//! checks the declared MIME type against [`AllowedType`]. Anything holding a
//! `StagedFile` therefore holds an allow-listed file.

use core::fmt;
use core::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Accept filter for file pickers, matching the allow-list by extension.
pub const ACCEPT_ATTRIBUTE: &str = ".pdf,.txt,.docx,.csv,.xlsx";

/// A MIME type outside the allow-list.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported file type: {0}")]
pub struct UnsupportedType(pub String);

/// The five document types a user may stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum AllowedType {
    Pdf,
    PlainText,
    Docx,
    Csv,
    Xlsx,
}

impl AllowedType {
    /// Every allow-listed type, in picker order.
    pub const ALL: [Self; 5] = [
        Self::Pdf,
        Self::PlainText,
        Self::Docx,
        Self::Csv,
        Self::Xlsx,
    ];

    /// The exact MIME string for this type.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// The file extension the picker accepts for this type.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "txt",
            Self::Docx => "docx",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl FromStr for AllowedType {
    type Err = UnsupportedType;

    /// Exact match against the allow-list. No parameter stripping or case
    /// folding: `text/plain; charset=utf-8` is not `text/plain`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.mime() == s)
            .ok_or_else(|| UnsupportedType(s.to_owned()))
    }
}

impl TryFrom<String> for AllowedType {
    type Error = UnsupportedType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AllowedType> for &'static str {
    fn from(ty: AllowedType) -> Self {
        ty.mime()
    }
}

impl fmt::Display for AllowedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A file the user has staged for upload.
///
/// Content is held in memory only and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedFile {
    name: String,
    mime: AllowedType,
    content: Bytes,
}

impl StagedFile {
    /// Stage a file if its declared MIME type is allow-listed.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedType`] when `mime` is not one of the five
    /// allow-listed types.
    pub fn accept(
        name: impl Into<String>,
        mime: &str,
        content: impl Into<Bytes>,
    ) -> Result<Self, UnsupportedType> {
        let mime = mime.parse()?;
        Ok(Self {
            name: name.into(),
            mime,
            content: content.into(),
        })
    }

    /// Display name as provided by the client.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn mime(&self) -> AllowedType {
        self.mime
    }

    #[must_use]
    pub const fn content(&self) -> &Bytes {
        &self.content
    }

    /// Size of the content in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

// Content is omitted; it can be megabytes of binary.
impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.content.len())
            .finish()
    }
}
