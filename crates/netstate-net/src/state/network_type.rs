//! Network type classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::reachability::ReachabilityFlags;

/// The kind of network the device is currently using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// No usable connection.
    None,
    /// State not known yet, or the OS could not report it.
    #[default]
    Unknown,
    /// Cellular data.
    Cellular,
    /// Wireless LAN.
    Wifi,
    /// Bluetooth tethering.
    Bluetooth,
    /// Wired Ethernet.
    Ethernet,
    /// Virtual private network.
    Vpn,
    /// Connected, but over something not listed above.
    Other,
}

impl NetworkType {
    /// Classify the network described by a reachability snapshot.
    pub fn from_flags(flags: ReachabilityFlags) -> Self {
        if !flags.is_connected() {
            Self::None
        } else if flags.contains(ReachabilityFlags::IS_WWAN) {
            Self::Cellular
        } else if flags.contains(ReachabilityFlags::IS_WIRED) {
            Self::Ethernet
        } else if flags.contains(ReachabilityFlags::IS_BLUETOOTH) {
            Self::Bluetooth
        } else if flags.contains(ReachabilityFlags::IS_OTHER_LINK) {
            Self::Other
        } else {
            Self::Wifi
        }
    }

    /// The string form used in serialized state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Unknown => "unknown",
            Self::Cellular => "cellular",
            Self::Wifi => "wifi",
            Self::Bluetooth => "bluetooth",
            Self::Ethernet => "ethernet",
            Self::Vpn => "vpn",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized network type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNetworkType(pub String);

impl fmt::Display for UnknownNetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network type: {}", self.0)
    }
}

impl std::error::Error for UnknownNetworkType {}

impl FromStr for NetworkType {
    type Err = UnknownNetworkType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "unknown" => Ok(Self::Unknown),
            "cellular" => Ok(Self::Cellular),
            "wifi" => Ok(Self::Wifi),
            "bluetooth" => Ok(Self::Bluetooth),
            "ethernet" => Ok(Self::Ethernet),
            "vpn" => Ok(Self::Vpn),
            "other" => Ok(Self::Other),
            _ => Err(UnknownNetworkType(s.to_string())),
        }
    }
}
