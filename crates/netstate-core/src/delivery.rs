//! Delivery contexts for listener notifications.
//!
//! A [`DeliveryContext`] decides where a connected slot runs when a
//! [`Signal`](crate::Signal) is emitted:
//!
//! - [`DeliveryContext::Direct`]: on the emitting thread, before `emit`
//!   returns. For reachability notifications this is the thread the OS
//!   callback arrived on.
//! - [`DeliveryContext::Dispatcher`]: handed to a host executor, typically a
//!   UI thread draining a [`ChannelDispatcher`].
//! - [`DeliveryContext::Tokio`]: spawned onto a tokio runtime (feature
//!   `tokio`).
//!
//! # Example
//!
//! ```
//! use netstate_core::{ChannelDispatcher, DeliveryContext, Signal};
//!
//! let (dispatcher, queue) = ChannelDispatcher::new();
//! let signal = Signal::<u32>::with_delivery(DeliveryContext::dispatcher(dispatcher));
//! signal.connect(|n| println!("got {n}"));
//!
//! signal.emit(7);
//! // Nothing has run yet; the host thread drains the queue.
//! assert_eq!(queue.run_pending(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{CoreError, Result};
use crate::logging::targets;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An executor that accepts tasks for later execution.
///
/// Implement this to route notifications onto a thread the host owns.
pub trait Dispatcher: Send + Sync {
    /// Accept a task for execution.
    ///
    /// Returns an error if the executor can no longer run tasks.
    fn dispatch(&self, task: Task) -> Result<()>;
}

/// Where connected slots are invoked.
#[derive(Clone, Default)]
pub enum DeliveryContext {
    /// Invoke on the emitting thread.
    #[default]
    Direct,
    /// Hand each invocation to a dispatcher.
    Dispatcher(Arc<dyn Dispatcher>),
    /// Spawn each invocation onto a tokio runtime.
    #[cfg(feature = "tokio")]
    Tokio(tokio::runtime::Handle),
}

impl DeliveryContext {
    /// Create a dispatcher-backed context.
    pub fn dispatcher<D: Dispatcher + 'static>(dispatcher: D) -> Self {
        Self::Dispatcher(Arc::new(dispatcher))
    }

    /// Check if slots run on the emitting thread.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }

    /// Run `task` in this context.
    ///
    /// If a dispatcher rejects the task it is executed on the current thread
    /// instead and a warning is logged.
    pub fn run(&self, task: Task) {
        match self {
            Self::Direct => task(),
            Self::Dispatcher(dispatcher) => {
                // The task is moved into the dispatcher; a rejecting
                // dispatcher hands nothing back, so wrap it to recover.
                let slot = Arc::new(parking_lot::Mutex::new(Some(task)));
                let queued = Arc::clone(&slot);
                let result = dispatcher.dispatch(Box::new(move || {
                    if let Some(task) = queued.lock().take() {
                        task();
                    }
                }));
                if let Err(err) = result {
                    tracing::warn!(
                        target: targets::DELIVERY,
                        error = %err,
                        "dispatcher rejected task, executing immediately"
                    );
                    let task = slot.lock().take();
                    if let Some(task) = task {
                        task();
                    }
                }
            }
            #[cfg(feature = "tokio")]
            Self::Tokio(handle) => {
                drop(handle.spawn(async move { task() }));
            }
        }
    }
}

impl fmt::Debug for DeliveryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "Direct"),
            Self::Dispatcher(_) => write!(f, "Dispatcher(..)"),
            #[cfg(feature = "tokio")]
            Self::Tokio(_) => write!(f, "Tokio(..)"),
        }
    }
}

/// A dispatcher backed by an unbounded channel.
///
/// The paired [`DispatchQueue`] is drained by whichever thread should run
/// the notifications.
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: Sender<Task>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the queue that drains it.
    pub fn new() -> (Self, DispatchQueue) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, DispatchQueue { receiver })
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, task: Task) -> Result<()> {
        self.sender
            .send(task)
            .map_err(|_| CoreError::DispatchFailed("dispatch queue dropped".to_string()))
    }
}

/// The receiving half of a [`ChannelDispatcher`].
pub struct DispatchQueue {
    receiver: Receiver<Task>,
}

impl DispatchQueue {
    /// Run every task that is currently queued.
    ///
    /// Returns the number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task();
                    count += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return count,
            }
        }
    }

    /// Block until one task arrives or the timeout elapses, then run it.
    ///
    /// Returns `true` if a task was executed.
    pub fn run_one_timeout(&self, timeout: std::time::Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(_) => false,
        }
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if no tasks are waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
