use crate::core::config::RootDirectory;
use crate::core::errors::{Error, Result};
use crate::models::file_entry::{DirectoryOption, FileEntry};
use crate::services::fs::listing;
use crate::services::fs::resolver::PathResolver;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Move,
    Copy,
}

impl TransferAction {
    pub fn parse(value: &str) -> Result<TransferAction> {
        match value {
            "move" => Ok(TransferAction::Move),
            "copy" => Ok(TransferAction::Copy),
            other => Err(Error::InvalidArgument(format!("unknown action '{other}'"))),
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            TransferAction::Move => "move",
            TransferAction::Copy => "copy",
        }
    }
}

/// A file read for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Mutating and transfer operations on the tree below the root.
///
/// Each operation resolves its own paths; nothing here accepts an absolute
/// path from a caller.
#[derive(Debug, Clone)]
pub struct FileOps {
    resolver: PathResolver,
}

impl FileOps {
    pub fn new(root: &RootDirectory) -> Self {
        Self {
            resolver: PathResolver::new(root),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Writes `content` to `dir/file_name`, replacing any existing file.
    ///
    /// Only the base name of `file_name` is used, and an existing symlink at
    /// the target is refused rather than written through.
    pub fn upload(&self, dir: &str, file_name: &str, content: &[u8]) -> Result<FileEntry> {
        let name = base_name(file_name)?;
        let target_dir = self.resolver.resolve(dir)?;
        if !target_dir.is_dir() {
            return Err(Error::NotFound(dir.to_string()));
        }

        let target = target_dir.join(name);
        match fs::symlink_metadata(&target) {
            Ok(md) if md.file_type().is_symlink() => {
                tracing::warn!(dir, file = name, "refused upload over symlink");
                return Err(Error::InvalidArgument(format!(
                    "'{name}' is a symbolic link and cannot be overwritten"
                )));
            }
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(Error::Io(err)),
        }
        fs::write(&target, content)?;
        let md = fs::metadata(&target)?;
        tracing::info!(dir, file = name, bytes = content.len(), "uploaded file");
        Ok(FileEntry::from_metadata(name, &md))
    }

    pub fn download(&self, path: &str) -> Result<Download> {
        let file = self.resolver.resolve(path)?;
        if !file.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }

        let file_name = file
            .file_name()
            .map(listing::os_str_to_string)
            .unwrap_or_default();
        let content = fs::read(&file)?;
        Ok(Download { file_name, content })
    }

    /// Deletes a file, or a directory with everything below it.
    pub fn delete(&self, path: &str) -> Result<()> {
        let target = self.existing_entry(path)?;
        let md = fs::symlink_metadata(&target)?;
        if md.is_dir() {
            fs::remove_dir_all(&target)?;
        } else {
            // Files and symlinks; a link is removed, never its target.
            fs::remove_file(&target)?;
        }
        tracing::info!(path, "deleted");
        Ok(())
    }

    pub fn move_or_copy(&self, source: &str, destination: &str, action: &str) -> Result<()> {
        let action = TransferAction::parse(action)?;
        let from = match action {
            TransferAction::Move => self.existing_entry(source)?,
            // Copies read through links, so the content must be confined too.
            TransferAction::Copy => self.resolver.resolve(source)?,
        };
        let to = self.resolver.resolve_target(destination)?;

        if fs::symlink_metadata(&to).is_ok() {
            return Err(Error::Io(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("destination '{destination}' already exists"),
            )));
        }
        if from.is_dir() && to.starts_with(&from) {
            return Err(Error::InvalidArgument(format!(
                "cannot {} '{source}' into itself",
                action.verb()
            )));
        }

        match action {
            TransferAction::Move => fs::rename(&from, &to)?,
            TransferAction::Copy if from.is_dir() => copy_tree(&from, &to)?,
            TransferAction::Copy => {
                fs::copy(&from, &to)?;
            }
        }
        tracing::info!(source, destination, action = action.verb(), "transfer complete");
        Ok(())
    }

    /// Immediate subdirectories of `root`, with paths relative to the root
    /// directory.
    pub fn list_subdirectories(&self, root: &str) -> Result<Vec<DirectoryOption>> {
        let dir = self.resolver.resolve(root)?;
        if !dir.is_dir() {
            return Err(Error::NotFound(root.to_string()));
        }

        let options = listing::list_subdirectories(&dir)?
            .into_iter()
            .filter_map(|(name, path)| {
                let full_path = self.resolver.relative(&path)?;
                Some(DirectoryOption { name, full_path })
            })
            .collect();
        Ok(options)
    }

    /// Resolves `path` without following a final symlink and requires that
    /// something exists there. The root itself is never returned.
    fn existing_entry(&self, path: &str) -> Result<PathBuf> {
        let target = self.resolver.resolve_target(path)?;
        match fs::symlink_metadata(&target) {
            Ok(_) => Ok(target),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::NotFound(path.to_string())),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

/// Recreates every directory below `source` at `destination` and copies every
/// file to its mirrored path. Symlinks inside the tree are skipped.
fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Other(e.to_string()))?;
        let target = destination.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            tracing::warn!("Not copying symlink {:?}", entry.path());
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn base_name(file_name: &str) -> Result<&str> {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    match name {
        "" | "." | ".." => Err(Error::InvalidArgument(format!(
            "invalid file name '{file_name}'"
        ))),
        name => Ok(name),
    }
}
