//! Wi-Fi specific details of the current network.

use std::time::Duration;

use netstate_core::logging::targets;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NetworkType, to_map};
use crate::reachability::ReachabilityFlags;
use crate::wifi::{WifiInfo, WifiInfoProvider};

/// Wi-Fi details of the current network.
///
/// Populated only while the current network is Wi-Fi; every field is
/// cleared when the network changes to anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDetails {
    /// Network name.
    pub ssid: Option<String>,
    /// Access point MAC address.
    pub bssid: Option<String>,
    /// Signal strength as a percentage (0-100).
    pub strength: Option<i32>,
    /// Channel frequency in MHz.
    pub frequency: Option<i32>,
    /// Link speed in Mbps.
    pub link_speed: Option<i32>,
}

impl NetworkDetails {
    /// Create empty details.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the parts of a reachability snapshot that affect details.
    ///
    /// Anything other than Wi-Fi clears every field. On Wi-Fi the last known
    /// values are kept until the next [`update_wifi_info`](Self::update_wifi_info).
    pub fn update_from_reachability(&mut self, flags: ReachabilityFlags) {
        if NetworkType::from_flags(flags) != NetworkType::Wifi {
            self.clear();
        }
    }

    /// Clear every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check if no field carries data.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy a Wi-Fi lookup result into these details.
    pub fn apply_wifi_info(&mut self, info: WifiInfo) {
        self.ssid = info.ssid;
        self.bssid = info.bssid;
        self.strength = info.strength;
        self.frequency = info.frequency;
        self.link_speed = info.link_speed;
    }

    /// Refresh the Wi-Fi fields from `provider`.
    ///
    /// The returned future resolves exactly once. A failed or timed-out
    /// lookup leaves the fields untouched; the only failure signal is the
    /// `false` return.
    pub async fn update_wifi_info(
        &mut self,
        provider: &dyn WifiInfoProvider,
        timeout: Duration,
    ) -> bool {
        match query_wifi(provider, timeout).await {
            Some(info) => {
                self.apply_wifi_info(info);
                true
            }
            None => false,
        }
    }

    /// Serialize into a string-keyed map.
    pub fn to_dictionary(&self) -> Map<String, Value> {
        to_map(self)
    }
}

/// Run a provider query bounded by `timeout`.
pub(crate) async fn query_wifi(
    provider: &dyn WifiInfoProvider,
    timeout: Duration,
) -> Option<WifiInfo> {
    match tokio::time::timeout(timeout, provider.query()).await {
        Ok(info) => info,
        Err(_) => {
            tracing::debug!(target: targets::WIFI, ?timeout, "wifi query timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;

    struct Fixed(Option<WifiInfo>);

    impl WifiInfoProvider for Fixed {
        fn query(&self) -> BoxFuture<'static, Option<WifiInfo>> {
            let info = self.0.clone();
            Box::pin(async move { info })
        }
    }

    struct Stalled;

    impl WifiInfoProvider for Stalled {
        fn query(&self) -> BoxFuture<'static, Option<WifiInfo>> {
            Box::pin(futures_util::future::pending())
        }
    }

    fn home() -> WifiInfo {
        WifiInfo {
            ssid: Some("Home".to_string()),
            bssid: Some("aa:bb:cc:dd:ee:ff".to_string()),
            strength: Some(80),
            frequency: Some(5180),
            link_speed: Some(866),
        }
    }

    #[test]
    fn test_non_wifi_clears() {
        let mut details = NetworkDetails::new();
        details.apply_wifi_info(home());

        details.update_from_reachability(ReachabilityFlags::REACHABLE);
        assert_eq!(details.ssid.as_deref(), Some("Home"));

        details.update_from_reachability(
            ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_WWAN,
        );
        assert!(details.is_empty());
    }

    #[tokio::test]
    async fn test_update_wifi_info_success() {
        let mut details = NetworkDetails::new();
        let updated = details
            .update_wifi_info(&Fixed(Some(home())), Duration::from_secs(1))
            .await;
        assert!(updated);
        assert_eq!(details.strength, Some(80));
        assert_eq!(details.link_speed, Some(866));
    }

    #[tokio::test]
    async fn test_failed_lookup_keeps_prior_values() {
        let mut details = NetworkDetails::new();
        details.apply_wifi_info(home());

        let updated = details
            .update_wifi_info(&Fixed(None), Duration::from_secs(1))
            .await;
        assert!(!updated);
        assert_eq!(details.ssid.as_deref(), Some("Home"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_lookup_times_out() {
        let mut details = NetworkDetails::new();
        details.apply_wifi_info(home());

        let updated = details
            .update_wifi_info(&Stalled, Duration::from_secs(5))
            .await;
        assert!(!updated);
        assert_eq!(details.frequency, Some(5180));
    }

    #[test]
    fn test_dictionary_nulls() {
        let dict = NetworkDetails::new().to_dictionary();
        for key in ["ssid", "bssid", "strength", "frequency", "linkSpeed"] {
            assert_eq!(dict[key], Value::Null, "{key}");
        }
        assert_eq!(dict.len(), 5);
    }
}
