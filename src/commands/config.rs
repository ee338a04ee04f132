use anyhow::Result;
use log::debug;
use reqwest::Client;

use crate::{
    VERSION,
    http::HttpClient,
    manager::{ManagerApi, NetworkCatalog},
    runtime::Runtime,
};

/// Environment variable overriding the network setup service URL.
pub const SERVER_HOST_ENV: &str = "FYBER_SKAD_NETWORKS_SERVER_HOST";

pub struct Config<R: Runtime, C: NetworkCatalog> {
    pub runtime: R,
    pub catalog: C,
}

impl<R: Runtime> Config<R, ManagerApi> {
    pub fn new(runtime: R, api_url: Option<String>) -> Result<Self> {
        let api_url = api_url.or_else(|| {
            let host = runtime.env_var(SERVER_HOST_ENV).ok()?;
            debug!("{} is set: {}", SERVER_HOST_ENV, host);
            Some(host).filter(|host| !host.is_empty())
        });

        let client = Client::builder()
            .user_agent(format!("skad_updater/{}", VERSION))
            .build()?;

        let catalog = ManagerApi::new(HttpClient::new(client), api_url);

        Ok(Self { runtime, catalog })
    }
}
