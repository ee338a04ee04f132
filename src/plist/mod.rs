//! The `Info.plist` file: which SKAdNetwork identifiers it declares, which
//! ones are missing, and writing the updated document back.

mod backup;
mod xml;

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::SkadError;
use crate::manager::{SkAdNetworkMap, all_identifiers};
use crate::runtime::Runtime;

pub use backup::next_backup_path;
pub use xml::{Insertion, Layout, ScanError};

/// A loaded `Info.plist` and the identifiers pending addition.
#[derive(Debug)]
pub struct Plist {
    path: PathBuf,
    source: String,
    layout: Layout,
    new_items: BTreeSet<String>,
}

impl Plist {
    /// Load and parse the `Info.plist` at `path`.
    #[tracing::instrument(level = "trace", skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let kind = runtime.file_kind(path);
        if !kind.is_regular() {
            return Err(SkadError::NotAFile(format!(
                "Provided plist_file_path is invalid : {}",
                kind
            ))
            .into());
        }

        let bytes = runtime.read(path)?;
        let source = String::from_utf8(bytes).map_err(|e| {
            error!("[{}] is not UTF-8 encoded", path.display());
            SkadError::InvalidPlist(format!(
                "Plist XML: invalid UTF-8 at byte {}",
                e.utf8_error().valid_up_to()
            ))
        })?;
        Self::parse(path, source)
    }

    /// Parse `source` as the content of `path`.
    pub fn parse(path: &Path, source: String) -> Result<Self> {
        let layout = xml::scan(&source).map_err(|e| {
            error!("XML [{}] parsed with errors", path.display());
            error!("error at [{}:{}]", path.display(), e.offset);
            SkadError::InvalidPlist(format!("Plist XML: {}", e.message))
        })?;

        debug!(
            "Extracted from [{}] : [{}]",
            path.display(),
            join(&layout.identifiers, ",")
        );

        Ok(Self {
            path: path.to_path_buf(),
            source,
            layout,
            new_items: BTreeSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers already declared in the file.
    pub fn existing_items(&self) -> &BTreeSet<String> {
        &self.layout.identifiers
    }

    /// Identifiers that [`Plist::render`] adds.
    pub fn new_items(&self) -> &BTreeSet<String> {
        &self.new_items
    }

    /// Record the identifiers received from the service and keep those not yet
    /// declared. Returns whether the file needs an update.
    pub fn set_items_for_update(&mut self, received: &SkAdNetworkMap) -> bool {
        self.new_items = all_identifiers(received)
            .into_iter()
            .filter(|id| !self.layout.identifiers.contains(id))
            .collect();

        debug!("Set New SKAdNetworkItems: {}", self.new_items_str());

        self.should_update()
    }

    pub fn should_update(&self) -> bool {
        !self.new_items.is_empty()
    }

    /// The document with the new identifiers added. Unchanged when there is
    /// nothing to add.
    pub fn render(&self) -> String {
        if !self.should_update() {
            return self.source.clone();
        }
        let rendered = xml::insert_identifiers(&self.source, self.layout.insertion, &self.new_items);
        debug!("New Info.plist: \n{}", rendered);
        rendered
    }

    /// Write the updated document over the file. With `backup`, the current
    /// file is first copied to the next `.bak.<N>` slot, whose path is returned.
    #[tracing::instrument(level = "trace", skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, backup: bool) -> Result<Option<PathBuf>> {
        let backup_path = if backup {
            let backup_path = next_backup_path(runtime, &self.path)?;
            runtime
                .copy(&self.path, &backup_path)
                .with_context(|| format!("Failed to back up {}", self.path.display()))?;
            info!(
                "Backup `{}` created at `{}`",
                self.path.display(),
                backup_path.display()
            );
            Some(backup_path)
        } else {
            None
        };

        let rendered = self.render();
        let temp_path = temp_path(&self.path);

        if let Err(e) = runtime.write(&temp_path, rendered.as_bytes()) {
            let _ = runtime.remove_file(&temp_path);
            return Err(e);
        }
        if let Err(e) = runtime.rename(&temp_path, &self.path) {
            let _ = runtime.remove_file(&temp_path);
            return Err(e);
        }

        info!("Saving new `{}`", self.path.display());

        Ok(backup_path)
    }

    pub fn existing_items_str(&self) -> String {
        join(&self.layout.identifiers, ", ")
    }

    pub fn new_items_str(&self) -> String {
        join(&self.new_items, ", ")
    }
}

/// Sibling file the new content is written to before replacing the original.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.skad_updater.tmp", name))
}

fn join(items: &BTreeSet<String>, delimiter: &str) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(delimiter)
}
