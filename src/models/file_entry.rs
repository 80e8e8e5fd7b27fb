use serde::Serialize;
use std::fs::Metadata;
use std::time::UNIX_EPOCH;
use time::OffsetDateTime;

/// Suffix appended to folder names in top-level listings.
pub const FOLDER_MARKER: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// A single file or folder as surfaced by listing and search.
///
/// `size` is present for files and absent for folders; the constructors are
/// the only way to build one so that pairing always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    name: String,
    #[serde(rename = "type")]
    kind: FileKind,
    size: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    last_modified: OffsetDateTime,
}

impl FileEntry {
    pub fn file(name: impl Into<String>, size: u64, last_modified: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            kind: FileKind::File,
            size: Some(size),
            last_modified,
        }
    }

    pub fn folder(name: impl Into<String>, last_modified: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            kind: FileKind::Folder,
            size: None,
            last_modified,
        }
    }

    pub fn from_metadata(name: impl Into<String>, md: &Metadata) -> Self {
        let modified = modified_time(md);
        if md.is_dir() {
            Self::folder(name, modified)
        } else {
            Self::file(name, md.len(), modified)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn last_modified(&self) -> OffsetDateTime {
        self.last_modified
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }
}

/// A subdirectory offered as a move/copy destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryOption {
    pub name: String,
    /// Path relative to the root directory, `/` separated.
    pub full_path: String,
}

fn modified_time(md: &Metadata) -> OffsetDateTime {
    md.modified()
        .ok()
        .filter(|t| *t >= UNIX_EPOCH)
        .map(OffsetDateTime::from)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
