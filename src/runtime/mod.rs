//! Runtime abstraction for system operations.
//!
//! Every environment lookup and file access of the updater goes through
//! [`Runtime`], so commands can run against a mock in tests.
//!
//! # Structure
//!
//! - `env` - Environment variables
//! - `fs` - File system operations (read, write, copy, directory listing)

mod env;
mod fs;

use anyhow::Result;
use std::env as std_env;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a path points to, as far as the updater cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Symlink,
    Missing,
    Unknown,
}

impl FileKind {
    pub fn is_regular(&self) -> bool {
        matches!(self, FileKind::Regular)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            FileKind::Regular => "-regular file-",
            FileKind::Directory => "-directory-",
            FileKind::BlockDevice => "-block device-",
            FileKind::CharDevice => "-character device-",
            FileKind::Fifo => "-named IPC pipe-",
            FileKind::Socket => "-named IPC socket-",
            FileKind::Symlink => "-symlink-",
            FileKind::Missing => "-does not exist-",
            FileKind::Unknown => "-unknown-",
        };
        f.write_str(description)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Classify a path, following symlinks. A dangling symlink is reported as
    /// [`FileKind::Symlink`].
    fn file_kind(&self, path: &Path) -> FileKind;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.read_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn file_kind(&self, path: &Path) -> FileKind {
        self.file_kind_impl(path)
    }
}
