//! Network state observation for netstate.
//!
//! This crate watches the host's connectivity and exposes it as plain,
//! serializable value objects:
//!
//! - **Reachability**: OS connectivity flags and the sources that report them
//! - **State Model**: Connection status, network type, capabilities and Wi-Fi details
//! - **Manager**: Owns the current state and notifies listeners on change
//! - **Interfaces**: Live enumeration of Wi-Fi and Ethernet interfaces
//!
//! # Observing Changes
//!
//! ```ignore
//! use netstate_net::NetworkStateManager;
//!
//! let manager = NetworkStateManager::new()?;
//!
//! let id = manager.connect(|state| {
//!     println!("type: {}, internet: {}", state.network_type, state.is_internet_reachable);
//! });
//! manager.start()?;
//!
//! if manager.is_network_type_available("wifi") {
//!     println!("strength: {:?}", manager.network_strength());
//! }
//!
//! manager.remove_listener(id);
//! ```
//!
//! # Deriving State From Flags
//!
//! ```
//! use netstate_net::{NetworkStateModel, NetworkType, ReachabilityFlags};
//!
//! let state = NetworkStateModel::from_reachability(
//!     ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_WWAN,
//! );
//! assert_eq!(state.network_type, NetworkType::Cellular);
//! assert!(state.is_expensive);
//! assert_eq!(state.to_dictionary()["type"], "cellular");
//! ```
//!
//! # Interfaces
//!
//! ```no_run
//! for iface in netstate_net::network_interfaces() {
//!     println!("{} ({:?}): {} addresses", iface.name, iface.kind, iface.addresses.len());
//! }
//! ```

mod config;
mod error;
pub mod interface;
mod manager;
pub mod reachability;
pub mod state;
pub mod wifi;

pub use config::NetworkStateConfig;
pub use error::{NetworkStateError, Result};
pub use interface::{
    InterfaceKind, IpAddressInfo, IpVersion, Ipv6Scope, NetworkInterfaceInfo, network_interfaces,
};
pub use manager::{
    ListenerId, NetworkStateListener, NetworkStateManager, NetworkStateManagerBuilder,
};
pub use reachability::{
    ReachabilityCallback, ReachabilityFlags, ReachabilitySource, ReachabilityWatch,
    SystemReachability,
};
pub use state::{NetworkCapabilities, NetworkDetails, NetworkStateModel, NetworkType};
pub use wifi::{IwWifiProvider, NoWifiInfo, WifiInfo, WifiInfoProvider};
