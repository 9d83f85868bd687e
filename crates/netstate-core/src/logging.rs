//! Logging facilities for netstate.
//!
//! netstate uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the host application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("netstate_net=debug,netstate_core::signal=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "netstate_core";
    /// Subscriber registry target.
    pub const SIGNAL: &str = "netstate_core::signal";
    /// Delivery context target.
    pub const DELIVERY: &str = "netstate_core::delivery";
    /// Reachability source target.
    pub const REACHABILITY: &str = "netstate_net::reachability";
    /// Wi-Fi lookup target.
    pub const WIFI: &str = "netstate_net::wifi";
    /// Interface enumeration target.
    pub const INTERFACES: &str = "netstate_net::interfaces";
    /// State manager target.
    pub const MANAGER: &str = "netstate_net::manager";
}

/// Span names used throughout netstate.
pub mod span_names {
    /// Listener notification span.
    pub const NOTIFY: &str = "netstate::notify";
    /// Wi-Fi refresh span.
    pub const WIFI_REFRESH: &str = "netstate::wifi_refresh";
}
