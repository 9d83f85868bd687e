//! Subscriber registry for netstate.
//!
//! A [`Signal`] holds an ordered set of connected slots (callbacks) keyed by
//! an opaque [`ConnectionId`]. Emitting the signal invokes every connected
//! slot with the emitted value through the signal's [`DeliveryContext`].
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The registry and emitter
//! - [`ConnectionId`] - Handle returned when connecting a slot
//! - [`ConnectionGuard`] - RAII handle that disconnects when dropped
//!
//! # Guarantees
//!
//! - `emit` snapshots the connection list before invoking anything, so slots
//!   may connect or disconnect (themselves included) while being notified.
//! - Once [`Signal::disconnect`] returns, the slot is never invoked again.
//!   An invocation already running on another thread is allowed to finish
//!   first; `disconnect` waits for it.
//!
//! # Example
//!
//! ```
//! use netstate_core::Signal;
//!
//! let state_changed = Signal::<String>::new();
//!
//! let id = state_changed.connect(|state| {
//!     println!("State changed to: {}", state);
//! });
//!
//! state_changed.emit("wifi".to_string());
//! state_changed.disconnect(id);
//! ```

use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, ReentrantMutex};
use slotmap::{SlotMap, new_key_type};

use crate::delivery::DeliveryContext;
use crate::error::{CoreError, Result};
use crate::logging::{span_names, targets};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// Liveness flag for a single connection.
///
/// Invocations hold the gate while the slot runs, and disconnection flips the
/// flag under the same gate. The lock is reentrant so a slot can disconnect
/// itself.
struct Gate {
    alive: ReentrantMutex<Cell<bool>>,
}

impl Gate {
    fn new() -> Self {
        Self {
            alive: ReentrantMutex::new(Cell::new(true)),
        }
    }

    fn close(&self) {
        self.alive.lock().set(false);
    }
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
    gate: Arc<Gate>,
}

impl<Args> Connection<Args> {
    fn invoke(slot: &(dyn Fn(&Args) + Send + Sync), gate: &Gate, args: &Args) {
        let alive = gate.alive.lock();
        if alive.get() {
            slot(args);
        }
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// `Signal<Args>` is `Send + Sync` and can be shared between threads. Where
/// slots run is decided by the [`DeliveryContext`] given at construction.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    blocked: AtomicBool,
    delivery: DeliveryContext,
}

impl<Args: Clone + Send + Sync + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + Sync + 'static> Signal<Args> {
    /// Create a new signal that invokes slots on the emitting thread.
    pub fn new() -> Self {
        Self::with_delivery(DeliveryContext::Direct)
    }

    /// Create a new signal with an explicit delivery context.
    pub fn with_delivery(delivery: DeliveryContext) -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
            delivery,
        }
    }

    /// The delivery context slots are invoked in.
    pub fn delivery(&self) -> &DeliveryContext {
        &self.delivery
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
            gate: Arc::new(Gate::new()),
        };
        let id = self.connections.lock().insert(connection);
        tracing::trace!(target: targets::SIGNAL, ?id, "slot connected");
        id
    }

    /// Connect a slot that is disconnected when the returned guard is dropped.
    pub fn connect_scoped<F>(self: &Arc<Self>, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            signal: Arc::downgrade(self),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.connections.lock().remove(id);
        match removed {
            Some(connection) => {
                connection.gate.close();
                tracing::trace!(target: targets::SIGNAL, ?id, "slot disconnected");
                true
            }
            None => false,
        }
    }

    /// Disconnect a slot, reporting unknown IDs as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<()> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(CoreError::InvalidConnection)
        }
    }

    /// Check if a connection is still registered.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().contains_key(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let drained: Vec<_> = self.connections.lock().drain().collect();
        for (_, connection) in drained {
            connection.gate.close();
        }
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// With [`DeliveryContext::Direct`] every slot has run when this returns.
    /// Other contexts only guarantee the invocations have been handed off.
    ///
    /// Returns the number of slots the value was delivered to.
    #[tracing::instrument(skip_all, target = "netstate_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return 0;
        }

        let snapshot: Vec<_> = self
            .connections
            .lock()
            .values()
            .map(|conn| (Arc::clone(&conn.slot), Arc::clone(&conn.gate)))
            .collect();

        let span = tracing::trace_span!(
            target: targets::SIGNAL,
            span_names::NOTIFY,
            connection_count = snapshot.len()
        );
        let _entered = span.enter();

        let count = snapshot.len();
        if self.delivery.is_direct() {
            for (slot, gate) in &snapshot {
                Connection::invoke(slot.as_ref(), gate, &args);
            }
        } else {
            for (slot, gate) in snapshot {
                let args = args.clone();
                self.delivery.run(Box::new(move || {
                    Connection::invoke(slot.as_ref(), &gate, &args);
                }));
            }
        }
        count
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`]. The guard holds a weak reference,
/// so it never keeps the signal alive.
pub struct ConnectionGuard<Args: Clone + Send + Sync + 'static> {
    signal: std::sync::Weak<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: Clone + Send + Sync + 'static> ConnectionGuard<Args> {
    /// The ID of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: Clone + Send + Sync + 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}
