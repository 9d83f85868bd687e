//! Reachability flag bitmask.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A reachability snapshot represented as bit flags.
///
/// The low bits follow the conventional reachability layout used by mobile
/// platforms. Bits 24 and up are host extensions describing the transport
/// of the default route. Any `u32` is a valid value; unknown bits are kept
/// but ignored.
///
/// # Example
///
/// ```
/// use netstate_net::ReachabilityFlags;
///
/// let flags = ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_WWAN;
/// assert!(flags.is_connected());
/// assert!(flags.contains(ReachabilityFlags::IS_WWAN));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReachabilityFlags(u32);

impl ReachabilityFlags {
    /// Nothing is reachable.
    pub const NONE: ReachabilityFlags = ReachabilityFlags(0);
    /// Reached over a transient connection such as PPP or a VPN.
    pub const TRANSIENT_CONNECTION: ReachabilityFlags = ReachabilityFlags(1 << 0);
    /// The target is reachable with the current configuration.
    pub const REACHABLE: ReachabilityFlags = ReachabilityFlags(1 << 1);
    /// A connection must be established first.
    pub const CONNECTION_REQUIRED: ReachabilityFlags = ReachabilityFlags(1 << 2);
    /// A connection is established automatically on traffic.
    pub const CONNECTION_ON_TRAFFIC: ReachabilityFlags = ReachabilityFlags(1 << 3);
    /// User intervention (e.g. a captive portal login) is needed.
    pub const INTERVENTION_REQUIRED: ReachabilityFlags = ReachabilityFlags(1 << 4);
    /// A connection is established on demand.
    pub const CONNECTION_ON_DEMAND: ReachabilityFlags = ReachabilityFlags(1 << 5);
    /// The target is an address local to this device.
    pub const IS_LOCAL_ADDRESS: ReachabilityFlags = ReachabilityFlags(1 << 16);
    /// Traffic does not go through a gateway.
    pub const IS_DIRECT: ReachabilityFlags = ReachabilityFlags(1 << 17);
    /// Reached over a cellular (WWAN) interface.
    pub const IS_WWAN: ReachabilityFlags = ReachabilityFlags(1 << 18);
    /// Reached over a wired interface.
    pub const IS_WIRED: ReachabilityFlags = ReachabilityFlags(1 << 24);
    /// Reached over a Bluetooth PAN interface.
    pub const IS_BLUETOOTH: ReachabilityFlags = ReachabilityFlags(1 << 25);
    /// The OS asked applications to limit data use.
    pub const IS_CONSTRAINED: ReachabilityFlags = ReachabilityFlags(1 << 26);
    /// Reached over a link of no recognized kind (bridge, virtual NIC).
    pub const IS_OTHER_LINK: ReachabilityFlags = ReachabilityFlags(1 << 27);

    /// Create flags from a raw bitmask.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw bitmask.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check if every bit in `other` is set.
    pub const fn contains(&self, other: ReachabilityFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if no bits are set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Check if the flags describe a usable connection.
    ///
    /// Reachable, and either no connection is required or one is brought up
    /// automatically without user intervention.
    pub fn is_connected(&self) -> bool {
        if !self.contains(Self::REACHABLE) {
            return false;
        }
        if !self.contains(Self::CONNECTION_REQUIRED) {
            return true;
        }
        let automatic = self.contains(Self::CONNECTION_ON_TRAFFIC)
            || self.contains(Self::CONNECTION_ON_DEMAND);
        automatic && !self.contains(Self::INTERVENTION_REQUIRED)
    }

    /// Check if traffic can leave the local link.
    pub fn has_internet(&self) -> bool {
        self.is_connected() && !self.contains(Self::IS_DIRECT)
    }

    /// Check if internet access needs no further user action.
    pub fn is_validated(&self) -> bool {
        self.has_internet() && !self.contains(Self::INTERVENTION_REQUIRED)
    }

    /// Check if a captive portal is blocking the network.
    pub fn is_captive_portal(&self) -> bool {
        self.contains(Self::REACHABLE) && self.contains(Self::INTERVENTION_REQUIRED)
    }
}

impl BitOr for ReachabilityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        ReachabilityFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReachabilityFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ReachabilityFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        ReachabilityFlags(self.0 & rhs.0)
    }
}

impl From<u32> for ReachabilityFlags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for ReachabilityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ReachabilityFlags, &str); 13] = [
            (ReachabilityFlags::TRANSIENT_CONNECTION, "TRANSIENT_CONNECTION"),
            (ReachabilityFlags::REACHABLE, "REACHABLE"),
            (ReachabilityFlags::CONNECTION_REQUIRED, "CONNECTION_REQUIRED"),
            (ReachabilityFlags::CONNECTION_ON_TRAFFIC, "CONNECTION_ON_TRAFFIC"),
            (ReachabilityFlags::INTERVENTION_REQUIRED, "INTERVENTION_REQUIRED"),
            (ReachabilityFlags::CONNECTION_ON_DEMAND, "CONNECTION_ON_DEMAND"),
            (ReachabilityFlags::IS_LOCAL_ADDRESS, "IS_LOCAL_ADDRESS"),
            (ReachabilityFlags::IS_DIRECT, "IS_DIRECT"),
            (ReachabilityFlags::IS_WWAN, "IS_WWAN"),
            (ReachabilityFlags::IS_WIRED, "IS_WIRED"),
            (ReachabilityFlags::IS_BLUETOOTH, "IS_BLUETOOTH"),
            (ReachabilityFlags::IS_CONSTRAINED, "IS_CONSTRAINED"),
            (ReachabilityFlags::IS_OTHER_LINK, "IS_OTHER_LINK"),
        ];

        if self.is_empty() {
            return write!(f, "ReachabilityFlags(NONE)");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "ReachabilityFlags({})", names.join(" | "))
    }
}
