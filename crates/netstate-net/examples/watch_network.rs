//! Network state watcher example.
//!
//! Prints the current network state, the live interfaces, and every change
//! until interrupted.
//!
//! Run with: cargo run -p netstate-net --example watch_network [config.toml]
//!
//! Set `RUST_LOG=netstate_net=debug` for library logging.

use netstate_net::{NetworkStateConfig, NetworkStateManager, NetworkStateModel};
use tracing_subscriber::EnvFilter;

fn print_state(state: &NetworkStateModel) {
    println!(
        "type={} connected={} internet={} expensive={} metered={}",
        state.network_type,
        state.is_connected,
        state.is_internet_reachable,
        state.is_expensive,
        state.is_metered
    );
    if !state.details.is_empty() {
        println!(
            "  ssid={:?} strength={:?} frequency={:?} link_speed={:?}",
            state.details.ssid,
            state.details.strength,
            state.details.frequency,
            state.details.link_speed
        );
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => NetworkStateConfig::from_file(&path).expect("Failed to load config"),
        None => NetworkStateConfig::default(),
    };

    let manager = NetworkStateManager::builder()
        .config(config)
        .build()
        .expect("Failed to create manager");

    println!("Interfaces:");
    for iface in manager.network_interfaces() {
        let addresses: Vec<String> = iface
            .addresses
            .iter()
            .map(|a| format!("{}/{}", a.address, a.prefix_length))
            .collect();
        let marker = if iface.is_default_route { " (default)" } else { "" };
        println!("  {} {:?}{}: {}", iface.name, iface.kind, marker, addresses.join(", "));
    }
    println!();

    manager.connect(print_state);
    manager.start().expect("Failed to start monitoring");

    if manager.refresh_wifi_info().await {
        println!("Wi-Fi strength: {:?}", manager.network_strength());
    }

    println!("Watching for changes, press Ctrl+C to exit");
    loop {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    }
}
