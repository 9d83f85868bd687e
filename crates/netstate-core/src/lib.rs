//! Core systems for netstate.
//!
//! This crate provides the plumbing shared by the netstate crates:
//!
//! - **Signal/Slot Registry**: Type-safe listener registration keyed by opaque IDs
//! - **Delivery Contexts**: Explicit control over which thread runs listeners
//! - **Logging**: `tracing` targets for per-subsystem filtering
//!
//! # Signal/Slot Example
//!
//! ```
//! use netstate_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod delivery;
mod error;
pub mod logging;
pub mod signal;

pub use delivery::{ChannelDispatcher, DeliveryContext, DispatchQueue, Dispatcher, Task};
pub use error::{CoreError, Result};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
