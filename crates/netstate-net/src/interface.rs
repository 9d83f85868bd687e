//! Network interface and address enumeration.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use netstate_core::logging::targets;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NetworkStateError, Result};
use crate::state::to_map;

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4.
    Ipv4,
    /// IPv6.
    Ipv6,
}

impl IpVersion {
    /// Largest valid prefix length for this family.
    pub fn max_prefix_len(&self) -> u8 {
        match self {
            Self::Ipv4 => 32,
            Self::Ipv6 => 128,
        }
    }

    /// The string form used in serialized state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility class of an IPv6 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ipv6Scope {
    /// Routable on the public internet.
    Global,
    /// Valid only on the attached link (`fe80::/10`).
    LinkLocal,
    /// Deprecated site-local range (`fec0::/10`).
    SiteLocal,
    /// Private unique-local range (`fc00::/7`).
    UniqueLocal,
    /// `::1`.
    Loopback,
    /// Multicast group address.
    Multicast,
}

impl Ipv6Scope {
    /// Classify an IPv6 address.
    pub fn of(address: &Ipv6Addr) -> Self {
        let first = address.segments()[0];
        if address.is_loopback() {
            Self::Loopback
        } else if address.is_multicast() {
            Self::Multicast
        } else if first & 0xffc0 == 0xfe80 {
            Self::LinkLocal
        } else if first & 0xffc0 == 0xfec0 {
            Self::SiteLocal
        } else if first & 0xfe00 == 0xfc00 {
            Self::UniqueLocal
        } else {
            Self::Global
        }
    }

    /// The string form used in serialized state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::LinkLocal => "link-local",
            Self::SiteLocal => "site-local",
            Self::UniqueLocal => "unique-local",
            Self::Loopback => "loopback",
            Self::Multicast => "multicast",
        }
    }
}

/// One address assigned to an interface.
///
/// Deserialization goes through [`IpAddressInfo::new`]: the prefix length is
/// validated and `version` and `scope` are recomputed from the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawIpAddressInfo")]
pub struct IpAddressInfo {
    /// The address, serialized in its textual form.
    pub address: IpAddr,
    /// Address family.
    pub version: IpVersion,
    /// Network prefix length (CIDR notation).
    pub prefix_length: u8,
    /// IPv6 visibility class; always `None` for IPv4.
    pub scope: Option<Ipv6Scope>,
}

impl IpAddressInfo {
    /// Create address info, validating the prefix length against the family.
    pub fn new(address: IpAddr, prefix_length: u8) -> Result<Self> {
        let version = match address {
            IpAddr::V4(_) => IpVersion::Ipv4,
            IpAddr::V6(_) => IpVersion::Ipv6,
        };
        if prefix_length > version.max_prefix_len() {
            return Err(NetworkStateError::InvalidPrefixLength {
                prefix_len: prefix_length,
                version: version.as_str(),
            });
        }
        let scope = match address {
            IpAddr::V4(_) => None,
            IpAddr::V6(v6) => Some(Ipv6Scope::of(&v6)),
        };
        Ok(Self {
            address,
            version,
            prefix_length,
            scope,
        })
    }

    /// Serialize into a string-keyed map.
    pub fn to_dictionary(&self) -> Map<String, Value> {
        to_map(self)
    }
}

/// Wire form of [`IpAddressInfo`]; derived fields are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIpAddressInfo {
    address: IpAddr,
    prefix_length: u8,
}

impl TryFrom<RawIpAddressInfo> for IpAddressInfo {
    type Error = NetworkStateError;

    fn try_from(raw: RawIpAddressInfo) -> Result<Self> {
        Self::new(raw.address, raw.prefix_length)
    }
}

/// Kind of interface reported by [`network_interfaces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    /// Wireless LAN.
    Wifi,
    /// Wired Ethernet.
    Ethernet,
}

/// A live network interface with its addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceInfo {
    /// Interface name (e.g., "wlan0", "en0", "eth0").
    pub name: String,
    /// Interface kind.
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    /// Assigned addresses, IPv4 first, in OS order.
    pub addresses: Vec<IpAddressInfo>,
    /// Whether this interface carries the default route.
    pub is_default_route: bool,
}

impl NetworkInterfaceInfo {
    /// Serialize into a string-keyed map.
    pub fn to_dictionary(&self) -> Map<String, Value> {
        to_map(self)
    }

    /// Check if this interface has any IPv4 address.
    pub fn has_ipv4(&self) -> bool {
        self.addresses.iter().any(|a| a.version == IpVersion::Ipv4)
    }
}

/// OS-level link classification used while filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkClass {
    Wifi,
    Ethernet,
    Cellular,
    Bluetooth,
    Tunnel,
    Loopback,
    Other,
}

impl LinkClass {
    /// Classify an interface from its netdev type and name.
    ///
    /// netdev reports most links as Ethernet, so well-known name prefixes
    /// refine the answer.
    pub(crate) fn classify(iface: &netdev::Interface) -> Self {
        use netdev::interface::InterfaceType;

        if iface.is_loopback() {
            return Self::Loopback;
        }
        if iface.is_tun() {
            return Self::Tunnel;
        }
        match iface.if_type {
            InterfaceType::Wireless80211 => Self::Wifi,
            InterfaceType::Loopback => Self::Loopback,
            InterfaceType::Tunnel | InterfaceType::Ppp => Self::Tunnel,
            InterfaceType::Wwanpp | InterfaceType::Wwanpp2 => Self::Cellular,
            _ => Self::from_name(&iface.name),
        }
    }

    pub(crate) fn from_name(name: &str) -> Self {
        const CELLULAR: [&str; 4] = ["pdp_ip", "rmnet", "wwan", "ccmni"];
        const TUNNEL: [&str; 6] = ["utun", "tun", "tap", "wg", "ppp", "ipsec"];
        const BLUETOOTH: [&str; 2] = ["bnep", "bt-pan"];

        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| name.starts_with(p));
        // Short prefixes only count when an interface number follows.
        let numbered = |prefix: &str| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
        };

        if name == "lo" || name.starts_with("lo0") {
            Self::Loopback
        } else if starts(&CELLULAR) {
            Self::Cellular
        } else if starts(&TUNNEL) {
            Self::Tunnel
        } else if starts(&BLUETOOTH) {
            Self::Bluetooth
        } else if name.starts_with("wl") || numbered("ath") || numbered("ra") {
            Self::Wifi
        } else if name.starts_with("en") || name.starts_with("eth") || numbered("usb") {
            Self::Ethernet
        } else {
            Self::Other
        }
    }

    fn kind(self) -> Option<InterfaceKind> {
        match self {
            Self::Wifi => Some(InterfaceKind::Wifi),
            Self::Ethernet => Some(InterfaceKind::Ethernet),
            _ => None,
        }
    }
}

/// Options controlling [`network_interfaces_with`].
#[derive(Debug, Clone, Copy)]
pub struct InterfaceFilter {
    /// Keep IPv6 link-local addresses.
    pub include_link_local: bool,
}

impl Default for InterfaceFilter {
    fn default() -> Self {
        Self {
            include_link_local: true,
        }
    }
}

/// Enumerate live Wi-Fi and Ethernet interfaces.
///
/// Always queries the OS; nothing is cached. Interfaces that are down,
/// loopback, tunnels, cellular or without addresses are skipped.
pub fn network_interfaces() -> Vec<NetworkInterfaceInfo> {
    network_interfaces_with(InterfaceFilter::default())
}

/// Enumerate live interfaces with custom filtering.
pub fn network_interfaces_with(filter: InterfaceFilter) -> Vec<NetworkInterfaceInfo> {
    let default_index = netdev::get_default_interface().ok().map(|iface| iface.index);
    let links = netdev::get_interfaces().iter().map(LinkEntry::from_netdev).collect();

    let interfaces = select_interfaces(links, default_index, filter);
    tracing::debug!(target: targets::INTERFACES, count = interfaces.len(), "enumerated interfaces");
    interfaces
}

/// The parts of an OS interface record that selection looks at.
#[derive(Debug, Clone)]
struct LinkEntry {
    index: u32,
    name: String,
    class: LinkClass,
    is_up: bool,
    /// Address and prefix length pairs, IPv4 first.
    addresses: Vec<(IpAddr, u8)>,
}

impl LinkEntry {
    fn from_netdev(iface: &netdev::Interface) -> Self {
        let v4 = iface
            .ipv4
            .iter()
            .map(|net| (IpAddr::V4(net.addr()), net.prefix_len()));
        let v6 = iface
            .ipv6
            .iter()
            .map(|net| (IpAddr::V6(net.addr()), net.prefix_len()));

        Self {
            index: iface.index,
            name: iface.name.clone(),
            class: LinkClass::classify(iface),
            is_up: iface.is_up(),
            addresses: v4.chain(v6).collect(),
        }
    }
}

fn select_interfaces(
    links: Vec<LinkEntry>,
    default_index: Option<u32>,
    filter: InterfaceFilter,
) -> Vec<NetworkInterfaceInfo> {
    links
        .into_iter()
        .filter(|link| link.is_up)
        .filter_map(|link| {
            let kind = link.class.kind()?;
            let addresses = collect_addresses(&link.addresses, filter);
            if addresses.is_empty() {
                return None;
            }
            Some(NetworkInterfaceInfo {
                is_default_route: default_index == Some(link.index),
                name: link.name,
                kind,
                addresses,
            })
        })
        .collect()
}

fn collect_addresses(addresses: &[(IpAddr, u8)], filter: InterfaceFilter) -> Vec<IpAddressInfo> {
    addresses
        .iter()
        .filter_map(|&(addr, prefix_len)| match IpAddressInfo::new(addr, prefix_len) {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::warn!(target: targets::INTERFACES, %addr, error = %err, "skipping address");
                None
            }
        })
        .filter(|info| filter.include_link_local || info.scope != Some(Ipv6Scope::LinkLocal))
        .collect()
}

/// Name of the first wireless interface that is up.
pub(crate) fn first_wireless_interface() -> Option<String> {
    netdev::get_interfaces()
        .into_iter()
        .find(|iface| iface.is_up() && LinkClass::classify(iface) == LinkClass::Wifi)
        .map(|iface| iface.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_prefix_length_validation() {
        let v4 = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));
        assert!(IpAddressInfo::new(v4, 24).is_ok());
        assert!(IpAddressInfo::new(v4, 32).is_ok());
        assert_eq!(
            IpAddressInfo::new(v4, 33),
            Err(NetworkStateError::InvalidPrefixLength {
                prefix_len: 33,
                version: "ipv4"
            })
        );

        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert!(IpAddressInfo::new(v6, 128).is_ok());
        assert!(IpAddressInfo::new(v6, 129).is_err());
    }

    #[test]
    fn test_ipv6_scope() {
        let scope = |s: &str| Ipv6Scope::of(&s.parse::<Ipv6Addr>().unwrap());
        assert_eq!(scope("fe80::1"), Ipv6Scope::LinkLocal);
        assert_eq!(scope("fd12:3456::1"), Ipv6Scope::UniqueLocal);
        assert_eq!(scope("fec0::1"), Ipv6Scope::SiteLocal);
        assert_eq!(scope("2001:db8::1"), Ipv6Scope::Global);
        assert_eq!(scope("::1"), Ipv6Scope::Loopback);
        assert_eq!(scope("ff02::1"), Ipv6Scope::Multicast);
    }

    #[test]
    fn test_ipv4_has_no_scope() {
        let info = IpAddressInfo::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 8).unwrap();
        assert_eq!(info.scope, None);
        assert_eq!(info.version, IpVersion::Ipv4);
    }

    #[test]
    fn test_address_dictionary() {
        let info = IpAddressInfo::new("fe80::1".parse().unwrap(), 64).unwrap();
        let dict = info.to_dictionary();
        assert_eq!(dict["address"], Value::from("fe80::1"));
        assert_eq!(dict["version"], Value::from("ipv6"));
        assert_eq!(dict["prefixLength"], Value::from(64));
        assert_eq!(dict["scope"], Value::from("link-local"));

        let v4 = IpAddressInfo::new("192.168.0.2".parse().unwrap(), 24).unwrap();
        assert_eq!(v4.to_dictionary()["scope"], Value::Null);
    }

    #[test]
    fn test_interface_dictionary() {
        let iface = NetworkInterfaceInfo {
            name: "wlan0".to_string(),
            kind: InterfaceKind::Wifi,
            addresses: vec![IpAddressInfo::new("192.168.0.2".parse().unwrap(), 24).unwrap()],
            is_default_route: true,
        };
        let dict = iface.to_dictionary();
        assert_eq!(dict["name"], Value::from("wlan0"));
        assert_eq!(dict["type"], Value::from("wifi"));
        assert_eq!(dict["isDefaultRoute"], Value::Bool(true));
        assert_eq!(dict["addresses"].as_array().map(Vec::len), Some(1));
        assert!(iface.has_ipv4());
    }

    #[test]
    fn test_classify_by_name() {
        assert_eq!(LinkClass::from_name("wlan0"), LinkClass::Wifi);
        assert_eq!(LinkClass::from_name("wlp2s0"), LinkClass::Wifi);
        assert_eq!(LinkClass::from_name("en0"), LinkClass::Ethernet);
        assert_eq!(LinkClass::from_name("eth1"), LinkClass::Ethernet);
        assert_eq!(LinkClass::from_name("pdp_ip0"), LinkClass::Cellular);
        assert_eq!(LinkClass::from_name("rmnet_data0"), LinkClass::Cellular);
        assert_eq!(LinkClass::from_name("utun3"), LinkClass::Tunnel);
        assert_eq!(LinkClass::from_name("wg0"), LinkClass::Tunnel);
        assert_eq!(LinkClass::from_name("bnep0"), LinkClass::Bluetooth);
        assert_eq!(LinkClass::from_name("lo"), LinkClass::Loopback);
        assert_eq!(LinkClass::from_name("docker0"), LinkClass::Other);
    }

    #[test]
    fn test_short_prefixes_need_a_number() {
        assert_eq!(LinkClass::from_name("ra0"), LinkClass::Wifi);
        assert_eq!(LinkClass::from_name("ath9"), LinkClass::Wifi);
        assert_eq!(LinkClass::from_name("radio"), LinkClass::Other);
        assert_eq!(LinkClass::from_name("usb0"), LinkClass::Ethernet);
        assert_eq!(LinkClass::from_name("usbmon"), LinkClass::Other);
    }

    #[test]
    fn test_deserialize_validates() {
        let info: IpAddressInfo = serde_json::from_str(
            r#"{"address":"10.0.0.1","version":"ipv6","prefixLength":8,"scope":"global"}"#,
        )
        .unwrap();
        assert_eq!(info.version, IpVersion::Ipv4);
        assert_eq!(info.scope, None);

        let err = serde_json::from_str::<IpAddressInfo>(
            r#"{"address":"10.0.0.1","version":"ipv6","prefixLength":200,"scope":null}"#,
        );
        assert!(err.is_err());

        let original = IpAddressInfo::new("fe80::1".parse().unwrap(), 64).unwrap();
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(serde_json::from_str::<IpAddressInfo>(&json).unwrap(), original);
    }

    fn entry(index: u32, name: &str, class: LinkClass, addresses: &[(&str, u8)]) -> LinkEntry {
        LinkEntry {
            index,
            name: name.to_string(),
            class,
            is_up: true,
            addresses: addresses
                .iter()
                .map(|(addr, prefix)| (addr.parse().unwrap(), *prefix))
                .collect(),
        }
    }

    #[test]
    fn test_select_interfaces() {
        let mut down = entry(3, "eth1", LinkClass::Ethernet, &[("10.1.0.2", 24)]);
        down.is_up = false;
        let links = vec![
            entry(1, "lo", LinkClass::Loopback, &[("127.0.0.1", 8), ("::1", 128)]),
            entry(
                2,
                "wlan0",
                LinkClass::Wifi,
                &[("192.168.1.20", 24), ("fe80::1", 64), ("2001:db8::20", 64)],
            ),
            down,
            entry(4, "eth0", LinkClass::Ethernet, &[]),
            entry(5, "wg0", LinkClass::Tunnel, &[("10.8.0.2", 32)]),
            entry(6, "rmnet0", LinkClass::Cellular, &[("100.64.0.9", 30)]),
            entry(7, "enp3s0", LinkClass::Ethernet, &[("10.0.0.5", 16)]),
        ];

        let selected = select_interfaces(links, Some(2), InterfaceFilter::default());
        let names: Vec<&str> = selected.iter().map(|iface| iface.name.as_str()).collect();
        assert_eq!(names, ["wlan0", "enp3s0"]);

        let wlan = &selected[0];
        assert_eq!(wlan.kind, InterfaceKind::Wifi);
        assert!(wlan.is_default_route);
        assert_eq!(wlan.addresses.len(), 3);
        assert_eq!(wlan.addresses[0].version, IpVersion::Ipv4);
        assert!(!selected[1].is_default_route);
    }

    #[test]
    fn test_select_without_link_local() {
        let links = vec![
            entry(2, "wlan0", LinkClass::Wifi, &[("fe80::1", 64), ("192.168.1.20", 24)]),
            entry(3, "eth0", LinkClass::Ethernet, &[("fe80::2", 64)]),
        ];
        let filter = InterfaceFilter {
            include_link_local: false,
        };

        let selected = select_interfaces(links, None, filter);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "wlan0");
        assert_eq!(selected[0].addresses.len(), 1);
        assert!(selected.iter().all(|iface| !iface.is_default_route));
    }

    #[test]
    fn test_invalid_prefix_is_skipped() {
        let links = vec![entry(
            2,
            "eth0",
            LinkClass::Ethernet,
            &[("10.0.0.5", 40), ("10.0.0.6", 24)],
        )];
        let selected = select_interfaces(links, None, InterfaceFilter::default());
        assert_eq!(selected[0].addresses.len(), 1);
        assert_eq!(selected[0].addresses[0].address, "10.0.0.6".parse::<IpAddr>().unwrap());
    }
}
