//! Wi-Fi link information lookup.
//!
//! The OS boundary is the [`WifiInfoProvider`] trait: an asynchronous query
//! that yields the current association or `None`. [`IwWifiProvider`] reads
//! it from `iw dev <iface> link` on Linux; [`NoWifiInfo`] is used where no
//! lookup is available.

use std::process::Stdio;

use futures_util::future::BoxFuture;
use netstate_core::logging::targets;

/// Current Wi-Fi association as reported by the OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiInfo {
    /// Network name.
    pub ssid: Option<String>,
    /// Access point MAC address, lowercase colon-separated.
    pub bssid: Option<String>,
    /// Signal strength as a percentage (0-100).
    pub strength: Option<i32>,
    /// Channel frequency in MHz.
    pub frequency: Option<i32>,
    /// Transmit link speed in Mbps.
    pub link_speed: Option<i32>,
}

impl WifiInfo {
    /// Check if no field carries data.
    pub fn is_empty(&self) -> bool {
        self.ssid.is_none()
            && self.bssid.is_none()
            && self.strength.is_none()
            && self.frequency.is_none()
            && self.link_speed.is_none()
    }
}

/// Asynchronous source of Wi-Fi association details.
pub trait WifiInfoProvider: Send + Sync {
    /// Query the current association.
    ///
    /// Resolves to `None` when there is no association or the lookup failed.
    fn query(&self) -> BoxFuture<'static, Option<WifiInfo>>;
}

/// A provider that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWifiInfo;

impl WifiInfoProvider for NoWifiInfo {
    fn query(&self) -> BoxFuture<'static, Option<WifiInfo>> {
        Box::pin(async { None })
    }
}

/// Reads the current association with the `iw` command-line tool.
#[derive(Debug, Clone)]
pub struct IwWifiProvider {
    interface: Option<String>,
}

impl IwWifiProvider {
    /// Query the first wireless interface found at lookup time.
    pub fn new() -> Self {
        Self { interface: None }
    }

    /// Query a specific interface.
    pub fn with_interface(interface: impl Into<String>) -> Self {
        Self {
            interface: Some(interface.into()),
        }
    }

    /// The configured interface override, if any.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }
}

impl Default for IwWifiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiInfoProvider for IwWifiProvider {
    fn query(&self) -> BoxFuture<'static, Option<WifiInfo>> {
        let interface = self.interface.clone();
        Box::pin(async move {
            let interface = match interface.or_else(crate::interface::first_wireless_interface) {
                Some(name) => name,
                None => {
                    tracing::debug!(target: targets::WIFI, "no wireless interface found");
                    return None;
                }
            };

            let output = tokio::process::Command::new("iw")
                .args(["dev", &interface, "link"])
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output()
                .await;

            match output {
                Ok(output) if output.status.success() => {
                    let text = String::from_utf8_lossy(&output.stdout);
                    let info = parse_iw_link_output(&text);
                    tracing::debug!(target: targets::WIFI, %interface, ?info, "iw link parsed");
                    info
                }
                Ok(output) => {
                    tracing::debug!(target: targets::WIFI, %interface, status = %output.status, "iw link failed");
                    None
                }
                Err(err) => {
                    tracing::debug!(target: targets::WIFI, error = %err, "could not run iw");
                    None
                }
            }
        })
    }
}

/// Parse the output of `iw dev <iface> link`.
///
/// Returns `None` for `Not connected.` or output without any usable field.
///
/// ```
/// use netstate_net::wifi::parse_iw_link_output;
///
/// let info = parse_iw_link_output(
///     "Connected to aa:bb:cc:dd:ee:ff (on wlan0)\n\tSSID: Home\n\tfreq: 5180\n\tsignal: -50 dBm\n",
/// )
/// .unwrap();
/// assert_eq!(info.ssid.as_deref(), Some("Home"));
/// assert_eq!(info.strength, Some(100));
/// ```
pub fn parse_iw_link_output(output: &str) -> Option<WifiInfo> {
    let mut info = WifiInfo::default();

    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Connected to ") {
            info.bssid = rest
                .split_whitespace()
                .next()
                .map(|mac| mac.to_ascii_lowercase());
        } else if let Some(ssid) = line.strip_prefix("SSID:") {
            let ssid = ssid.trim();
            if !ssid.is_empty() {
                info.ssid = Some(ssid.to_string());
            }
        } else if let Some(freq) = line.strip_prefix("freq:") {
            info.frequency = parse_leading_number(freq).map(|mhz| mhz.round() as i32);
        } else if let Some(signal) = line.strip_prefix("signal:") {
            info.strength = parse_leading_number(signal)
                .map(|dbm| dbm_to_percent(dbm.clamp(-1000.0, 1000.0) as i32));
        } else if let Some(rate) = line.strip_prefix("tx bitrate:") {
            info.link_speed = parse_leading_number(rate).map(|mbps| mbps.round() as i32);
        }
    }

    if info.is_empty() { None } else { Some(info) }
}

fn parse_leading_number(text: &str) -> Option<f64> {
    text.split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Map an RSSI in dBm onto 0-100, linear between -100 dBm and -50 dBm.
pub fn dbm_to_percent(dbm: i32) -> i32 {
    dbm.saturating_add(100).saturating_mul(2).clamp(0, 100)
}
