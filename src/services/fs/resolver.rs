use crate::core::config::RootDirectory;
use crate::core::errors::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Maps client supplied relative paths onto the root directory.
///
/// Every path handed to the filesystem by this crate goes through here first.
/// A resolved path is accepted only when it is the root itself or lies below
/// it on a directory boundary, so a root of `/data` never admits `/data-old`.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    root_str: String,
    prefix: String,
}

impl PathResolver {
    pub fn new(root: &RootDirectory) -> Self {
        let root = root.path().to_path_buf();
        let root_str = root.to_string_lossy().to_string();
        let mut prefix = root_str.clone();
        if !prefix.ends_with(MAIN_SEPARATOR) {
            prefix.push(MAIN_SEPARATOR);
        }
        Self {
            root,
            root_str,
            prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `user_path` to an existing, canonical path inside the root.
    pub fn resolve(&self, user_path: &str) -> Result<PathBuf> {
        let relative = strip_leading_separators(user_path);
        if !lexically_confined(Path::new(relative)) {
            tracing::warn!(path = user_path, "rejected path escaping root");
            return Err(Error::Confinement);
        }

        let joined = self.root.join(relative);
        let canonical = fs::canonicalize(&joined).map_err(|err| match err.kind() {
            // Also covers walking through a file, e.g. `notes.txt/inner`.
            ErrorKind::NotFound => Error::NotFound(user_path.to_string()),
            _ if !joined.exists() => Error::NotFound(user_path.to_string()),
            _ => Error::Io(err),
        })?;

        if !self.contains(&canonical) {
            tracing::warn!(path = user_path, "rejected path resolving outside root");
            return Err(Error::Confinement);
        }
        Ok(canonical)
    }

    /// Resolves a path whose last component may not exist yet.
    ///
    /// The parent must exist inside the root and the last component must be a
    /// plain name. Used for upload targets and move/copy destinations.
    pub fn resolve_target(&self, user_path: &str) -> Result<PathBuf> {
        let relative = Path::new(strip_leading_separators(user_path));
        if !lexically_confined(relative) {
            tracing::warn!(path = user_path, "rejected path escaping root");
            return Err(Error::Confinement);
        }

        let name = match relative.components().next_back() {
            Some(Component::Normal(name)) => name.to_os_string(),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "'{user_path}' does not name an entry below the root"
                )))
            }
        };
        let parent = relative
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let parent = self.resolve(&parent).map_err(|err| match err {
            Error::NotFound(_) => Error::NotFound(user_path.to_string()),
            other => other,
        })?;
        Ok(parent.join(name))
    }

    /// Renders a confined path relative to the root with `/` separators.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rest
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }

    fn contains(&self, candidate: &Path) -> bool {
        let candidate = candidate.to_string_lossy();
        candidate == self.root_str || candidate.starts_with(&self.prefix)
    }
}

fn strip_leading_separators(user_path: &str) -> &str {
    user_path.trim_start_matches(['/', '\\'])
}

/// Walks the components without touching the filesystem and reports whether
/// the path stays at or below its starting directory.
fn lexically_confined(relative: &Path) -> bool {
    let mut depth: usize = 0;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
