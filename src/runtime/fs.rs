//! File system operations (read, write, copy, directory listing).

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{FileKind, RealRuntime};

impl RealRuntime {
    #[tracing::instrument(level = "trace", skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn read_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn rename_impl(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).context("Failed to rename file")
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn copy_impl(&self, from: &Path, to: &Path) -> Result<u64> {
        fs::copy(from, to).context("Failed to copy file")
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).context("Failed to remove file")
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn read_dir_impl(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(path)
            .with_context(|| format!("Failed to list {}", path.display()))?
            .map(|entry| -> Result<PathBuf> { Ok(entry?.path()) })
            .collect()
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn file_kind_impl(&self, path: &Path) -> FileKind {
        match fs::metadata(path) {
            Ok(meta) => kind_of(&meta.file_type()),
            Err(e) if e.kind() == ErrorKind::NotFound => match fs::symlink_metadata(path) {
                Ok(meta) if meta.file_type().is_symlink() => FileKind::Symlink,
                _ => FileKind::Missing,
            },
            Err(_) => FileKind::Unknown,
        }
    }
}

fn kind_of(file_type: &fs::FileType) -> FileKind {
    if file_type.is_file() {
        return FileKind::Regular;
    }
    if file_type.is_dir() {
        return FileKind::Directory;
    }
    if file_type.is_symlink() {
        return FileKind::Symlink;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_block_device() {
            return FileKind::BlockDevice;
        }
        if file_type.is_char_device() {
            return FileKind::CharDevice;
        }
        if file_type.is_fifo() {
            return FileKind::Fifo;
        }
        if file_type.is_socket() {
            return FileKind::Socket;
        }
    }

    FileKind::Unknown
}
