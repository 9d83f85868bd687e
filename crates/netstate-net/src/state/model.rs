//! Aggregate network state snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NetworkCapabilities, NetworkDetails, NetworkType, to_map};
use crate::reachability::ReachabilityFlags;

/// A complete, self-consistent snapshot of the device's connectivity.
///
/// `NetworkStateModel::default()` is the `unknown` state used before any
/// reachability information has arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStateModel {
    /// A usable connection exists.
    pub is_connected: bool,
    /// The internet can be reached without further user action.
    pub is_internet_reachable: bool,
    /// Kind of the current network.
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    /// Traffic is costly (cellular, or the OS asked to save data).
    pub is_expensive: bool,
    /// Traffic is billed by volume (cellular).
    pub is_metered: bool,
    /// Transport and capability flags.
    pub capabilities: NetworkCapabilities,
    /// Wi-Fi details, empty unless on Wi-Fi.
    pub details: NetworkDetails,
}

impl NetworkStateModel {
    /// Create the `unknown` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from a reachability snapshot.
    pub fn from_reachability(flags: ReachabilityFlags) -> Self {
        let mut model = Self::new();
        model.update_from_reachability(flags);
        model
    }

    /// Recompute every field from `flags`.
    ///
    /// Capabilities are replaced wholesale; details keep their Wi-Fi fields
    /// only if the network is still Wi-Fi.
    pub fn update_from_reachability(&mut self, flags: ReachabilityFlags) {
        let connected = flags.is_connected();
        let costly = flags.contains(ReachabilityFlags::IS_WWAN)
            || flags.contains(ReachabilityFlags::IS_CONSTRAINED);

        self.is_connected = connected;
        self.is_internet_reachable = flags.is_validated();
        self.network_type = NetworkType::from_flags(flags);
        self.is_expensive = connected && costly;
        self.is_metered = connected && flags.contains(ReachabilityFlags::IS_WWAN);
        self.capabilities = NetworkCapabilities::from_reachability(flags);
        self.details.update_from_reachability(flags);
    }

    /// Check if a network type is currently available.
    ///
    /// Transport types are looked up in the capabilities; `none` and
    /// `unknown` compare against the current type.
    pub fn is_network_type_available(&self, network_type: NetworkType) -> bool {
        match network_type {
            NetworkType::None => !self.is_connected,
            NetworkType::Unknown | NetworkType::Other => self.network_type == network_type,
            _ => self.capabilities.has_transport(network_type),
        }
    }

    /// Serialize into a string-keyed map with nested maps for
    /// `capabilities` and `details`.
    pub fn to_dictionary(&self) -> Map<String, Value> {
        to_map(self)
    }
}
