//! Numbered backups: `Info.plist` is copied to `Info.plist.bak.<N>` before
//! every write, N counting up from the largest backup already present.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

const BACKUP_EXTENSION: &str = ".bak.";

/// The path the next backup of `path` should be written to.
pub fn next_backup_path<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    let file_name = file_name(path)?;
    let id = next_backup_id(runtime, path, &file_name)?;
    Ok(path.with_file_name(format!("{}{}{}", file_name, BACKUP_EXTENSION, id)))
}

fn next_backup_id<R: Runtime>(runtime: &R, path: &Path, file_name: &str) -> Result<u32> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{}{}", file_name, BACKUP_EXTENSION);

    let max = runtime
        .read_dir(dir)?
        .iter()
        .filter_map(|entry| entry.file_name()?.to_str()?.strip_prefix(&prefix).map(str::to_string))
        .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    match max.checked_add(1) {
        Some(id) => Ok(id),
        None => bail!("No backup slot left after {}{}{}", file_name, BACKUP_EXTENSION, max),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no file name", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_first_backup_is_one() {
        let dir = tempdir().unwrap();
        let plist = dir.path().join("Info.plist");
        std::fs::write(&plist, "<plist/>").unwrap();

        let backup = next_backup_path(&RealRuntime, &plist).unwrap();

        assert_eq!(backup, dir.path().join("Info.plist.bak.1"));
    }

    #[test]
    fn test_backup_follows_largest_numeric_suffix() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .with(eq(Path::new("/app")))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/app/Info.plist"),
                    PathBuf::from("/app/Info.plist.bak.1"),
                    PathBuf::from("/app/Info.plist.bak.7"),
                    PathBuf::from("/app/Info.plist.bak.old"),
                    PathBuf::from("/app/Info.plist.bak."),
                    PathBuf::from("/app/Other.plist.bak.9"),
                ])
            });

        let backup = next_backup_path(&runtime, Path::new("/app/Info.plist")).unwrap();

        assert_eq!(backup, PathBuf::from("/app/Info.plist.bak.8"));
    }

    #[test]
    fn test_backup_numbering_exhausted() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Ok(vec![PathBuf::from("/app/Info.plist.bak.4294967295")]));

        let err = next_backup_path(&runtime, Path::new("/app/Info.plist")).unwrap_err();

        assert_eq!(
            err.to_string(),
            "No backup slot left after Info.plist.bak.4294967295"
        );
    }

    #[test]
    fn test_relative_path_lists_current_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .with(eq(Path::new(".")))
            .returning(|_| Ok(vec![PathBuf::from("./Info.plist.bak.2")]));

        let backup = next_backup_path(&runtime, Path::new("Info.plist")).unwrap();

        assert_eq!(backup, PathBuf::from("Info.plist.bak.3"));
    }

    #[test]
    fn test_path_without_file_name_fails() {
        let runtime = MockRuntime::new();
        assert!(next_backup_path(&runtime, Path::new("/")).is_err());
    }
}
