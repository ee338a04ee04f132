//! Client for the network setup service that publishes SKAdNetwork identifiers.
//!
//! Two endpoints are used:
//!
//! - `GET /networks` lists the network names the service knows about, in the
//!   spelling used by CocoaPods (`AdColony`, `Google-Mobile-Ads-SDK`, ...).
//! - `GET /plist?network_list=A,B` maps each requested network to its
//!   SKAdNetwork identifiers. Unknown networks map to an empty list.

mod api;
mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use api::{DEFAULT_API_URL, ManagerApi};
pub use types::{SkAdNetworkMap, all_identifiers};

/// Source of supported networks and their SKAdNetwork identifiers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkCatalog: Send + Sync {
    /// Names of all networks the service can resolve.
    async fn networks(&self) -> Result<Vec<String>>;

    /// SKAdNetwork identifiers for each of the given networks.
    async fn sk_ad_networks(&self, networks: &[String]) -> Result<SkAdNetworkMap>;
}
