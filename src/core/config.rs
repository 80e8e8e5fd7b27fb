use crate::core::errors::{Error, Result};
use clap::Parser;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT: &str = ".";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 128 * 1024 * 1024;

/// Command line and environment configuration for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "filebrowser", about = "Browse a directory tree over HTTP")]
pub struct Args {
    /// Directory exposed to clients. Nothing outside of it is reachable.
    #[arg(env = "FILEBROWSER_ROOT")]
    pub root: Option<PathBuf>,

    #[arg(long, env = "FILEBROWSER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory with the browser UI assets, served for non-API routes.
    #[arg(long, env = "FILEBROWSER_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[arg(long, env = "FILEBROWSER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Args {
    /// Root directory requested on the command line, falling back to the
    /// working directory.
    pub fn root_or_default(&self) -> PathBuf {
        match &self.root {
            Some(root) => {
                tracing::info!("Root directory set to: {}", root.display());
                root.clone()
            }
            None => {
                tracing::warn!(
                    "No root directory provided, using '{}' as fallback",
                    DEFAULT_ROOT
                );
                PathBuf::from(DEFAULT_ROOT)
            }
        }
    }
}

/// The directory every client path is resolved against.
///
/// Built once at startup and shared read-only afterwards. The stored path is
/// canonical, so prefix checks against other canonical paths are meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDirectory {
    path: PathBuf,
}

impl RootDirectory {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = fs::canonicalize(path.as_ref())?;
        if !path.is_dir() {
            return Err(Error::Other(format!(
                "root '{}' is not a directory",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
