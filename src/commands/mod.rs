use anyhow::Result;

use crate::{
    manager::NetworkCatalog,
    options::{Action, UpdateOptions},
    runtime::Runtime,
};

pub mod config;
mod networks;
mod update;

pub use update::Outcome;

use config::Config;

/// Run the action selected on the command line against the real service.
#[tracing::instrument(level = "trace", skip(runtime, api_url))]
pub async fn execute<R: Runtime>(runtime: R, action: Action, api_url: Option<String>) -> Result<()> {
    let config = Config::new(runtime, api_url)?;
    match action {
        Action::ShowNetworks => show_networks(&config.catalog).await,
        Action::Update(options) => update(config, &options).await.map(|_| ()),
    }
}

/// Bring the plist in line with the identifiers published for the selected networks.
#[tracing::instrument(level = "trace", skip(config))]
pub async fn update<R: Runtime, C: NetworkCatalog>(
    config: Config<R, C>,
    options: &UpdateOptions,
) -> Result<Outcome> {
    update::run(&config.runtime, &config.catalog, options).await
}

/// Print the names of all networks the service supports.
#[tracing::instrument(level = "trace", skip(catalog))]
pub async fn show_networks<C: NetworkCatalog>(catalog: &C) -> Result<()> {
    let networks = catalog.networks().await?;
    println!("Supported network names: {}", networks.join(","));
    Ok(())
}
