use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::networks::{merge_network_lists, network_list_by_options, network_list_by_podfile};
use crate::{manager::NetworkCatalog, options::UpdateOptions, plist::Plist, runtime::Runtime};

/// How an update run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every published identifier is already declared.
    Unchanged,
    /// `--dry_run`: these identifiers would have been added.
    DryRun { new_items: BTreeSet<String> },
    /// The file was rewritten after being copied to `backup`.
    Updated {
        new_items: BTreeSet<String>,
        backup: Option<PathBuf>,
    },
}

#[tracing::instrument(level = "trace", skip(runtime, catalog))]
pub async fn run<R: Runtime, C: NetworkCatalog>(
    runtime: &R,
    catalog: &C,
    options: &UpdateOptions,
) -> Result<Outcome> {
    let mut plist = Plist::load(runtime, &options.plist_file_path)?;
    info!("Existing SKAdNetworks: {}", plist.existing_items_str());

    let mut networks = match &options.pod_file_path {
        Some(path) => network_list_by_podfile(runtime, catalog, path).await?,
        None => Vec::new(),
    };
    if let Some(network_list) = &options.network_list {
        let explicit = network_list_by_options(network_list)?;
        networks = merge_network_lists(networks, &explicit);
    }

    info!("Fetching SKAdNetworks for: {}", networks.join(", "));
    let received = catalog.sk_ad_networks(&networks).await?;

    plist.set_items_for_update(&received);
    info!("New SKAdNetworks: {}", plist.new_items_str());

    if !plist.should_update() {
        info!(
            "Nothing to update. `{}` unchanged.",
            options.plist_file_path.display()
        );
        return Ok(Outcome::Unchanged);
    }

    info!("Updating `{}`", options.plist_file_path.display());

    if options.dry_run {
        info!("These network IDs will be added: {}", plist.new_items_str());
        debug!("{}", plist.render());
        return Ok(Outcome::DryRun {
            new_items: plist.new_items().clone(),
        });
    }

    let backup = plist.save(runtime, true)?;

    Ok(Outcome::Updated {
        new_items: plist.new_items().clone(),
        backup,
    })
}
