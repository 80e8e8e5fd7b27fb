use crate::models::file_entry::FileEntry;
use crate::services::fs::listing::{compare_names, os_str_to_string};
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

/// Case-insensitive name search below `dir`. `term` must already be lowercase.
///
/// Traversal is depth first and pre-order: a matching folder is emitted before
/// anything found inside it, and a match never stops the descent. Files of a
/// directory are emitted after all of its subdirectories. A directory that
/// cannot be read contributes nothing and the walk carries on.
///
/// Folder entries use the bare name, without the listing's trailing `/`.
pub fn search(dir: &Path, term: &str) -> Vec<FileEntry> {
    let mut results = Vec::new();
    search_into(dir, term, &mut results);
    results
}

struct Child {
    name: String,
    path: PathBuf,
    md: Metadata,
    /// Symlinked directories are reported but never descended into.
    descend: bool,
}

fn search_into(dir: &Path, term: &str, results: &mut Vec<FileEntry>) {
    let children = match read_children(dir) {
        Ok(children) => children,
        Err(err) => {
            tracing::warn!("Skipped: {} - {}", dir.display(), err);
            return;
        }
    };

    let (folders, files): (Vec<Child>, Vec<Child>) =
        children.into_iter().partition(|c| c.md.is_dir());

    for folder in folders {
        if matches(&folder.name, term) {
            results.push(FileEntry::from_metadata(folder.name.as_str(), &folder.md));
        }
        if folder.descend {
            search_into(&folder.path, term, results);
        }
    }

    for file in files {
        if matches(&file.name, term) {
            results.push(FileEntry::from_metadata(file.name.as_str(), &file.md));
        }
    }
}

/// Enumerates every child of `dir` up front so a failure part way through
/// leaves `results` untouched for this directory.
fn read_children(dir: &Path) -> io::Result<Vec<Child>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_link = entry.file_type()?.is_symlink();
        let md = match fs::metadata(&path) {
            Ok(md) => md,
            Err(err) => {
                tracing::warn!("Skipped: {} - {}", path.display(), err);
                continue;
            }
        };
        children.push(Child {
            name: os_str_to_string(entry.file_name()),
            descend: md.is_dir() && !is_link,
            path,
            md,
        });
    }
    children.sort_by(|a, b| compare_names(&a.name, &b.name));
    Ok(children)
}

fn matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(term)
}
