//! OS reachability sources.

use std::any::Any;

use netstate_core::logging::targets;

use super::ReachabilityFlags;
use crate::error::{NetworkStateError, Result};
use crate::interface::LinkClass;

/// Callback invoked by a source whenever reachability may have changed.
pub type ReachabilityCallback = Box<dyn Fn(ReachabilityFlags) + Send + Sync + 'static>;

/// Keeps an OS change subscription alive. Dropping it unsubscribes.
pub struct ReachabilityWatch {
    _handle: Box<dyn Any + Send>,
}

impl ReachabilityWatch {
    /// Wrap a platform handle whose drop ends the subscription.
    pub fn new<H: Send + 'static>(handle: H) -> Self {
        Self {
            _handle: Box::new(handle),
        }
    }

    /// A watch with nothing to release, for sources that never notify.
    pub fn detached() -> Self {
        Self::new(())
    }
}

impl std::fmt::Debug for ReachabilityWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReachabilityWatch")
    }
}

/// The platform boundary that reports reachability.
pub trait ReachabilitySource: Send + Sync {
    /// Query the current flags.
    ///
    /// Returns `None` if the OS cannot report reachability at all.
    fn current_flags(&self) -> Option<ReachabilityFlags>;

    /// Subscribe to change notifications.
    ///
    /// The callback runs on whatever thread the OS delivers changes on.
    fn watch(&self, callback: ReachabilityCallback) -> Result<ReachabilityWatch>;
}

/// Reachability derived from the system's default route.
///
/// Uses `netdev` to find the default interface and gateway, and
/// `netwatcher` for change notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemReachability;

impl SystemReachability {
    /// Create a system reachability source.
    pub fn new() -> Self {
        Self
    }
}

impl ReachabilitySource for SystemReachability {
    fn current_flags(&self) -> Option<ReachabilityFlags> {
        system_flags()
    }

    fn watch(&self, callback: ReachabilityCallback) -> Result<ReachabilityWatch> {
        let handle = netwatcher::watch_interfaces(move |update| {
            tracing::trace!(
                target: targets::REACHABILITY,
                added = update.diff.added.len(),
                removed = update.diff.removed.len(),
                "interface update"
            );
            match system_flags() {
                Some(flags) => callback(flags),
                None => {
                    tracing::debug!(target: targets::REACHABILITY, "interfaces unavailable, skipping update");
                }
            }
        })
        .map_err(|e| NetworkStateError::Watch(e.to_string()))?;

        Ok(ReachabilityWatch::new(handle))
    }
}

fn system_flags() -> Option<ReachabilityFlags> {
    let interfaces = netdev::get_interfaces();
    if interfaces.is_empty() {
        tracing::warn!(target: targets::REACHABILITY, "no interfaces reported by the OS");
        return None;
    }

    let default = match netdev::get_default_interface() {
        Ok(iface) => iface,
        Err(err) => {
            tracing::debug!(target: targets::REACHABILITY, error = %err, "no default interface");
            return Some(ReachabilityFlags::NONE);
        }
    };

    let class = LinkClass::classify(&default);
    // For a tunnel, the physical transport is the first other live link.
    let underlying = (class == LinkClass::Tunnel)
        .then(|| {
            interfaces.iter().find_map(|iface| {
                let other = LinkClass::classify(iface);
                let physical = !matches!(other, LinkClass::Tunnel | LinkClass::Loopback);
                let live = iface.is_up() && !iface.ipv4.is_empty();
                (physical && live && iface.index != default.index).then_some(other)
            })
        })
        .flatten();

    let link = DefaultLink {
        class,
        underlying,
        is_up: default.is_up(),
        has_addresses: !default.ipv4.is_empty() || !default.ipv6.is_empty(),
        has_gateway: netdev::get_default_gateway().is_ok(),
    };
    let flags = link.flags();
    tracing::debug!(target: targets::REACHABILITY, interface = %default.name, ?flags, "system reachability");
    Some(flags)
}

/// What is known about the default-route interface.
#[derive(Debug, Clone, Copy)]
struct DefaultLink {
    class: LinkClass,
    underlying: Option<LinkClass>,
    is_up: bool,
    has_addresses: bool,
    has_gateway: bool,
}

impl DefaultLink {
    fn flags(&self) -> ReachabilityFlags {
        if !self.is_up || !self.has_addresses || self.class == LinkClass::Loopback {
            return ReachabilityFlags::NONE;
        }

        let mut flags = ReachabilityFlags::REACHABLE;
        let transport = if self.class == LinkClass::Tunnel {
            flags |= ReachabilityFlags::TRANSIENT_CONNECTION;
            self.underlying
        } else {
            Some(self.class)
        };
        flags |= match transport {
            Some(LinkClass::Cellular) => ReachabilityFlags::IS_WWAN,
            Some(LinkClass::Ethernet) => ReachabilityFlags::IS_WIRED,
            Some(LinkClass::Bluetooth) => ReachabilityFlags::IS_BLUETOOTH,
            Some(LinkClass::Other) => ReachabilityFlags::IS_OTHER_LINK,
            _ => ReachabilityFlags::NONE,
        };
        if !self.has_gateway {
            flags |= ReachabilityFlags::IS_DIRECT;
        }
        flags
    }
}
