//! Reachability flags and the OS sources that report them.

mod flags;
mod source;

pub use flags::ReachabilityFlags;
pub use source::{ReachabilityCallback, ReachabilitySource, ReachabilityWatch, SystemReachability};
