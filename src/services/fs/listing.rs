use crate::core::errors::{Error, Result};
use crate::models::file_entry::{FileEntry, FOLDER_MARKER};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Lists the immediate children of `dir`, folders first, then files.
///
/// Folder names carry a trailing `/` for display. Within each group entries
/// are ordered by name so that later stable sorts break ties predictably.
pub fn list_dir(dir: &Path) -> Result<Vec<FileEntry>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(display_name(dir)));
    }
    let read = fs::read_dir(dir).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Error::NotFound(display_name(dir)),
        _ => Error::Io(err),
    })?;

    // Collect names and paths first (cheap), stat afterwards.
    let mut names: Vec<(String, PathBuf)> = Vec::new();
    for entry in read {
        let entry = entry?;
        names.push((os_str_to_string(entry.file_name()), entry.path()));
    }
    names.sort_by(|a, b| compare_names(&a.0, &b.0));

    let mut folders = Vec::new();
    let mut files = Vec::new();
    for (name, path) in names {
        // Follows symlinks, so a link to a directory lists as a folder.
        let md = match fs::metadata(&path) {
            Ok(md) => md,
            Err(err) => {
                tracing::warn!("Skipped: {} - {}", path.display(), err);
                continue;
            }
        };
        if md.is_dir() {
            folders.push(FileEntry::from_metadata(format!("{name}{FOLDER_MARKER}"), &md));
        } else {
            files.push(FileEntry::from_metadata(name, &md));
        }
    }

    folders.extend(files);
    Ok(folders)
}

/// Immediate subdirectories of `dir` as `(name, path)` pairs, sorted by name.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((os_str_to_string(entry.file_name()), path));
        }
    }
    dirs.sort_by(|a, b| compare_names(&a.0, &b.0));
    Ok(dirs)
}

/// Case-insensitive name order; names differing only in case fall back to
/// ordinal order.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub(crate) fn os_str_to_string(s: impl AsRef<OsStr>) -> String {
    s.as_ref().to_string_lossy().into_owned()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(os_str_to_string)
        .unwrap_or_default()
}
