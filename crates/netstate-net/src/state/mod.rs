//! Network state value objects.
//!
//! All of these are plain data derived from a [`ReachabilityFlags`]
//! snapshot, plus the asynchronously refreshed Wi-Fi details. Each one
//! serializes to a string-keyed map with stable camelCase keys for hosts
//! that bridge the state into a scripting layer.
//!
//! [`ReachabilityFlags`]: crate::ReachabilityFlags

mod capabilities;
mod details;
mod model;
mod network_type;

pub use capabilities::NetworkCapabilities;
pub use details::NetworkDetails;
pub(crate) use details::query_wifi;
pub use model::NetworkStateModel;
pub use network_type::{NetworkType, UnknownNetworkType};

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a value object into a JSON object map.
///
/// Value objects here are structs of plain fields, so serialization
/// cannot fail and always yields an object.
pub(crate) fn to_map<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
