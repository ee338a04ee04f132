use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Network name -> SKAdNetwork identifiers, as returned by `GET /plist`.
pub type SkAdNetworkMap = BTreeMap<String, Vec<String>>;

/// Body of `GET /networks`.
#[derive(Debug, Deserialize)]
pub(crate) struct NetworksResponse {
    pub networks: Vec<String>,
}

/// Every identifier mentioned in the map, deduplicated and sorted.
pub fn all_identifiers(map: &SkAdNetworkMap) -> BTreeSet<String> {
    map.values().flatten().cloned().collect()
}
