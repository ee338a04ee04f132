use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde_json::error::Category;

use super::NetworkCatalog;
use super::types::{NetworksResponse, SkAdNetworkMap};
use crate::error::SkadError;
use crate::http::{HttpClient, HttpError};

/// Production network setup service.
pub const DEFAULT_API_URL: &str = "https://network-setup.fyber.com";

/// HTTP implementation of [`NetworkCatalog`].
pub struct ManagerApi {
    client: HttpClient,
    api_url: String,
}

impl ManagerApi {
    pub fn new(client: HttpClient, api_url: Option<String>) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        debug!("Remote set to {}", api_url);
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}

#[async_trait]
impl NetworkCatalog for ManagerApi {
    #[tracing::instrument(level = "trace", skip(self))]
    async fn networks(&self) -> Result<Vec<String>> {
        let body = self
            .client
            .get_text(&self.endpoint("networks"), &[])
            .await
            .map_err(request_error)?;

        let networks = decode_networks(&body)?;
        debug!("Returned networks: {}", networks.join(","));

        Ok(networks)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    async fn sk_ad_networks(&self, networks: &[String]) -> Result<SkAdNetworkMap> {
        let network_list = networks.join(",");
        let body = self
            .client
            .get_text(&self.endpoint("plist"), &[("network_list", network_list.as_str())])
            .await
            .map_err(request_error)?;

        let sk_ad_networks = decode_sk_ad_networks(&body)?;
        debug!("returned sk_ad_networks: {}", describe(&sk_ad_networks));

        Ok(sk_ad_networks)
    }
}

/// Decodes `{"networks": ["AdColony", "Google-Mobile-Ads-SDK", ...]}`.
fn decode_networks(body: &str) -> Result<Vec<String>, SkadError> {
    serde_json::from_str::<NetworksResponse>(body)
        .map(|response| response.networks)
        .map_err(|e| decode_error("Networks", e))
}

/// Decodes `{"AdColony": ["4PFYVQ9L8R.skadnetwork", ...], "Unknown_network": []}`.
fn decode_sk_ad_networks(body: &str) -> Result<SkAdNetworkMap, SkadError> {
    serde_json::from_str::<SkAdNetworkMap>(body).map_err(|e| decode_error("SKAdNetworks", e))
}

fn decode_error(what: &str, error: serde_json::Error) -> SkadError {
    match error.classify() {
        Category::Data => SkadError::InvalidNetworks(format!("{} parsing error: {}", what, error)),
        _ => SkadError::InvalidNetworks(format!(
            "Invalid {} returned from server: {}",
            what, error
        )),
    }
}

fn request_error(error: HttpError) -> SkadError {
    match error {
        HttpError::Status { url, status, body } => SkadError::ServerUnavailable(format!(
            "Connection to '{}' failed ({}) : {}",
            url, status, body
        )),
        HttpError::Transport { url, message } => {
            SkadError::RemoteApiFailure(format!("API failure for '{}': {}", url, message))
        }
    }
}

fn describe(sk_ad_networks: &SkAdNetworkMap) -> String {
    let entries: Vec<String> = sk_ad_networks
        .iter()
        .map(|(name, ids)| format!("{}: [{}]", name, ids.join(",")))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
