//! Resolving which networks to fetch identifiers for.

use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{error::SkadError, manager::NetworkCatalog, podfile::PodFile, runtime::Runtime};

/// Supported networks used by the Podfile at `path`.
#[tracing::instrument(level = "trace", skip(runtime, catalog))]
pub(crate) async fn network_list_by_podfile<R: Runtime, C: NetworkCatalog>(
    runtime: &R,
    catalog: &C,
    path: &Path,
) -> Result<Vec<String>> {
    let supported = catalog.networks().await?;
    let podfile = PodFile::load(runtime, path, &supported)?;

    if podfile.used_networks().is_empty() {
        return Err(
            SkadError::EmptyPodFile("No supported networks found in your Podfile".into()).into(),
        );
    }

    Ok(podfile.used_networks().to_vec())
}

/// Networks named with `--network_list`.
pub(crate) fn network_list_by_options(network_list: &[String]) -> Result<Vec<String>> {
    if network_list.is_empty() {
        return Err(SkadError::EmptyNetworkList(
            "A non-empty list of networks must be provided".into(),
        )
        .into());
    }
    Ok(network_list.to_vec())
}

/// Append the names of `extra` missing from `networks`, keeping the order of both.
pub(crate) fn merge_network_lists(mut networks: Vec<String>, extra: &[String]) -> Vec<String> {
    for network in extra {
        if !networks.contains(network) {
            networks.push(network.clone());
        }
    }
    debug!("Merged network list: {}", networks.join(","));
    networks
}
