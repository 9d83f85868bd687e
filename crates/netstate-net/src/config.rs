//! Configuration for the network state manager.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkStateError, Result};
use crate::interface::InterfaceFilter;

/// Tunables for [`NetworkStateManager`](crate::NetworkStateManager).
///
/// Can be built in code or loaded from TOML:
///
/// ```
/// use netstate_net::NetworkStateConfig;
///
/// let config = NetworkStateConfig::from_toml_str(r#"
///     wifi_query_timeout_ms = 2000
///     refresh_wifi_on_change = false
/// "#).unwrap();
/// assert_eq!(config.wifi_query_timeout().as_millis(), 2000);
/// assert!(config.include_link_local);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkStateConfig {
    /// Upper bound for one Wi-Fi lookup, in milliseconds.
    pub wifi_query_timeout_ms: u64,
    /// Start a Wi-Fi lookup whenever the network becomes Wi-Fi.
    pub refresh_wifi_on_change: bool,
    /// Wireless interface to query. `None` picks the first one found.
    pub wifi_interface: Option<String>,
    /// Report IPv6 link-local addresses from interface enumeration.
    pub include_link_local: bool,
}

impl Default for NetworkStateConfig {
    fn default() -> Self {
        Self {
            wifi_query_timeout_ms: 5_000,
            refresh_wifi_on_change: true,
            wifi_interface: None,
            include_link_local: true,
        }
    }
}

impl NetworkStateConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.wifi_query_timeout_ms == 0 {
            return Err(NetworkStateError::Config(
                "wifi_query_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(name) = &self.wifi_interface {
            if name.trim().is_empty() {
                return Err(NetworkStateError::Config(
                    "wifi_interface must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The Wi-Fi lookup timeout.
    pub fn wifi_query_timeout(&self) -> Duration {
        Duration::from_millis(self.wifi_query_timeout_ms)
    }

    /// Set the Wi-Fi lookup timeout.
    pub fn with_wifi_query_timeout(mut self, timeout: Duration) -> Self {
        self.wifi_query_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable the automatic Wi-Fi lookup on network changes.
    pub fn refresh_wifi_on_change(mut self, enabled: bool) -> Self {
        self.refresh_wifi_on_change = enabled;
        self
    }

    /// Query a specific wireless interface.
    pub fn wifi_interface(mut self, name: impl Into<String>) -> Self {
        self.wifi_interface = Some(name.into());
        self
    }

    /// Keep or drop IPv6 link-local addresses in interface listings.
    pub fn include_link_local(mut self, include: bool) -> Self {
        self.include_link_local = include;
        self
    }

    pub(crate) fn interface_filter(&self) -> InterfaceFilter {
        InterfaceFilter {
            include_link_local: self.include_link_local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NetworkStateConfig::default();
        assert_eq!(config.wifi_query_timeout(), Duration::from_secs(5));
        assert!(config.refresh_wifi_on_change);
        assert!(config.wifi_interface.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = NetworkStateConfig::new()
            .with_wifi_query_timeout(Duration::from_millis(750))
            .refresh_wifi_on_change(false)
            .wifi_interface("wlan1")
            .include_link_local(false);
        assert_eq!(config.wifi_query_timeout_ms, 750);
        assert!(!config.refresh_wifi_on_change);
        assert_eq!(config.wifi_interface.as_deref(), Some("wlan1"));
        assert!(!config.interface_filter().include_link_local);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = NetworkStateConfig::from_toml_str("").unwrap();
        assert_eq!(config, NetworkStateConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = NetworkStateConfig::from_toml_str("wifi_query_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, NetworkStateError::Config(_)));

        let err = NetworkStateConfig::from_toml_str("wifi_query_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, NetworkStateError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wifi_interface = \"wlp3s0\"").unwrap();
        let config = NetworkStateConfig::from_file(file.path()).unwrap();
        assert_eq!(config.wifi_interface.as_deref(), Some("wlp3s0"));

        let missing = NetworkStateConfig::from_file("/nonexistent/netstate.toml");
        assert!(matches!(missing, Err(NetworkStateError::Io(_))));
    }
}
