//! Podfile scanning.
//!
//! Only `pod '<Name>...'` lines matter: a line selects the first supported
//! network whose name prefixes the pod name, so subspecs such as
//! `pod 'Google-Mobile-Ads-SDK/Mediation'` resolve to their network too.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::SkadError;
use crate::runtime::Runtime;

/// The networks a Podfile depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodFile {
    path: PathBuf,
    networks: Vec<String>,
}

impl PodFile {
    /// Parse the Podfile at `path`, keeping the networks listed in `supported_networks`.
    #[tracing::instrument(level = "trace", skip(runtime, supported_networks))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path, supported_networks: &[String]) -> Result<Self> {
        let kind = runtime.file_kind(path);
        if !kind.is_regular() {
            return Err(
                SkadError::NotAFile(format!("Provided pod_file_path is invalid : {}", kind)).into(),
            );
        }

        let content = runtime.read(path).map_err(|e| {
            debug!("Reading {:?} failed: {:#}", path, e);
            SkadError::InvalidPodFile(format!("Unable to open podfile '{}'.", path.display()))
        })?;

        // Pod names are ASCII; other bytes only show up in comments and strings.
        let networks = parse(&String::from_utf8_lossy(&content), supported_networks);
        debug!("pod file contains these networks: [{}]", networks.join(","));

        Ok(Self {
            path: path.to_path_buf(),
            networks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Networks used by the Podfile, in order of first appearance.
    pub fn used_networks(&self) -> &[String] {
        &self.networks
    }
}

fn parse(content: &str, supported_networks: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for line in content.lines() {
        let Some(pod_name) = pod_name(line.trim_start()) else {
            continue;
        };

        let matched = supported_networks
            .iter()
            .find(|network| pod_name.starts_with(network.as_str()));

        if let Some(network) = matched {
            if !found.contains(network) {
                found.push(network.clone());
            }
        }
    }

    found
}

/// The text following the opening quote of a `pod` declaration.
fn pod_name(line: &str) -> Option<&str> {
    line.strip_prefix("pod '")
        .or_else(|| line.strip_prefix("pod \""))
}
