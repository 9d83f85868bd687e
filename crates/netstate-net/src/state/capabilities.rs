//! Named capabilities derived from reachability flags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NetworkType;
use super::to_map;
use crate::reachability::ReachabilityFlags;

/// Transport and capability booleans for the current network.
///
/// Every field is a pure function of the most recent flags passed to
/// [`update_from_reachability`](Self::update_from_reachability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCapabilities {
    /// Traffic goes over Wi-Fi.
    pub has_transport_wifi: bool,
    /// Traffic goes over cellular data.
    pub has_transport_cellular: bool,
    /// Traffic goes over wired Ethernet.
    pub has_transport_ethernet: bool,
    /// Traffic goes over Bluetooth tethering.
    pub has_transport_bluetooth: bool,
    /// Traffic goes through a VPN.
    pub has_transport_vpn: bool,
    /// The network can reach beyond the local link.
    pub has_capability_internet: bool,
    /// Internet access needs no further user action.
    pub has_capability_validated: bool,
    /// A captive portal is intercepting traffic.
    pub has_capability_captive_portal: bool,
}

impl NetworkCapabilities {
    /// Create capabilities with every flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build capabilities from a reachability snapshot.
    pub fn from_reachability(flags: ReachabilityFlags) -> Self {
        let mut capabilities = Self::new();
        capabilities.update_from_reachability(flags);
        capabilities
    }

    /// Recompute every field from `flags`.
    pub fn update_from_reachability(&mut self, flags: ReachabilityFlags) {
        let connected = flags.is_connected();
        let network_type = NetworkType::from_flags(flags);

        self.has_transport_wifi = network_type == NetworkType::Wifi;
        self.has_transport_cellular = network_type == NetworkType::Cellular;
        self.has_transport_ethernet = network_type == NetworkType::Ethernet;
        self.has_transport_bluetooth = network_type == NetworkType::Bluetooth;
        self.has_transport_vpn =
            connected && flags.contains(ReachabilityFlags::TRANSIENT_CONNECTION);
        self.has_capability_internet = flags.has_internet();
        self.has_capability_validated = flags.is_validated();
        self.has_capability_captive_portal = flags.is_captive_portal();
    }

    /// Check if the named transport is present.
    ///
    /// `None`, `Unknown` and `Other` have no transport flag and return `false`.
    pub fn has_transport(&self, network_type: NetworkType) -> bool {
        match network_type {
            NetworkType::Wifi => self.has_transport_wifi,
            NetworkType::Cellular => self.has_transport_cellular,
            NetworkType::Ethernet => self.has_transport_ethernet,
            NetworkType::Bluetooth => self.has_transport_bluetooth,
            NetworkType::Vpn => self.has_transport_vpn,
            NetworkType::None | NetworkType::Unknown | NetworkType::Other => false,
        }
    }

    /// Serialize into a string-keyed map.
    pub fn to_dictionary(&self) -> Map<String, Value> {
        to_map(self)
    }
}
