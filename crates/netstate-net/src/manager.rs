//! The network state manager.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use netstate_core::logging::{span_names, targets};
use netstate_core::{ConnectionId, DeliveryContext, Signal};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::Instrument;

use crate::config::NetworkStateConfig;
use crate::error::Result;
use crate::interface::{self, NetworkInterfaceInfo};
use crate::reachability::{
    ReachabilityFlags, ReachabilitySource, ReachabilityWatch, SystemReachability,
};
use crate::state::{NetworkStateModel, NetworkType, query_wifi};
use crate::wifi::WifiInfoProvider;

/// Identifies a registered listener. Pass it to
/// [`NetworkStateManager::remove_listener`].
pub type ListenerId = ConnectionId;

/// Receives network state snapshots.
pub trait NetworkStateListener: Send + Sync {
    /// Called with the new state after every update.
    fn on_network_state_changed(&self, state: &NetworkStateModel);
}

/// Owns the current [`NetworkStateModel`] and notifies listeners when it
/// changes.
///
/// The manager starts in the `unknown` state. [`start`](Self::start)
/// subscribes to the reachability source and performs an initial refresh;
/// every subsequent OS notification rebuilds the model and notifies all
/// listeners.
///
/// # Delivery
///
/// Listeners run in the [`DeliveryContext`] given to the builder. The
/// default, [`DeliveryContext::Direct`], runs them on the thread the OS
/// delivered the reachability callback on (or the thread that called
/// [`force_refresh`](Self::force_refresh)), and all of them have run before
/// that call returns. Wi-Fi refreshes complete later on the async runtime.
///
/// # Example
///
/// ```ignore
/// use netstate_net::NetworkStateManager;
///
/// let manager = NetworkStateManager::new()?;
/// manager.connect(|state| {
///     println!("now on {} (connected: {})", state.network_type, state.is_connected);
/// });
/// manager.start()?;
/// ```
#[derive(Clone)]
pub struct NetworkStateManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    state: RwLock<NetworkStateModel>,
    /// Bumped with every reachability update, with the outbox held.
    generation: AtomicU64,
    last_flags: Mutex<Option<ReachabilityFlags>>,
    /// Held across a state write and its notification so listeners see
    /// snapshots in the order they were written. Reentrant: an update
    /// triggered from a listener is queued behind the current delivery.
    outbox: ReentrantMutex<RefCell<Outbox>>,
    state_changed: Signal<NetworkStateModel>,
    source: Arc<dyn ReachabilitySource>,
    wifi: Arc<dyn WifiInfoProvider>,
    config: NetworkStateConfig,
    runtime: Option<tokio::runtime::Handle>,
    /// Handle to stop the OS watcher (drop to stop).
    watch: Mutex<Option<ReachabilityWatch>>,
}

impl NetworkStateManager {
    /// Create a manager backed by the system reachability source.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start building a manager.
    pub fn builder() -> NetworkStateManagerBuilder {
        NetworkStateManagerBuilder::new()
    }

    /// Subscribe to OS reachability changes and load the current state.
    ///
    /// Calling `start` on a running manager is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut watch = self.inner.watch.lock();
        if watch.is_some() {
            return Ok(());
        }

        let weak: Weak<ManagerInner> = Arc::downgrade(&self.inner);
        let handle = self.inner.source.watch(Box::new(move |flags| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_flags(flags);
            }
        }))?;
        *watch = Some(handle);
        drop(watch);

        tracing::info!(target: targets::MANAGER, "network state monitoring started");
        self.force_refresh();
        Ok(())
    }

    /// Stop receiving OS reachability changes. The current state is kept.
    pub fn stop(&self) {
        let watch = self.inner.watch.lock().take();
        if watch.is_some() {
            tracing::info!(target: targets::MANAGER, "network state monitoring stopped");
        }
        drop(watch);
    }

    /// Check if the manager is subscribed to OS changes.
    pub fn is_running(&self) -> bool {
        self.inner.watch.lock().is_some()
    }

    /// Register a listener. The manager holds it weakly: once every other
    /// `Arc` is dropped it stops receiving notifications, and its
    /// registration is removed at the next notification.
    pub fn add_listener<L>(&self, listener: &Arc<L>) -> ListenerId
    where
        L: NetworkStateListener + 'static,
    {
        let weak = Arc::downgrade(listener);
        let manager = Arc::downgrade(&self.inner);
        let registered: Arc<OnceLock<ListenerId>> = Arc::default();

        let own_id = Arc::clone(&registered);
        let id = self.inner.state_changed.connect(move |state| match weak.upgrade() {
            Some(listener) => listener.on_network_state_changed(state),
            None => {
                if let (Some(inner), Some(&id)) = (manager.upgrade(), own_id.get()) {
                    inner.state_changed.disconnect(id);
                    tracing::debug!(target: targets::MANAGER, ?id, "removed dropped listener");
                }
            }
        });
        let _ = registered.set(id);
        id
    }

    /// Register a closure as a listener.
    pub fn connect<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&NetworkStateModel) + Send + Sync + 'static,
    {
        self.inner.state_changed.connect(callback)
    }

    /// Unregister a listener.
    ///
    /// Once this returns the listener is never invoked again. Returns
    /// `false` if the ID was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.state_changed.disconnect(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.state_changed.connection_count()
    }

    /// A snapshot of the current state.
    pub fn current_network_state(&self) -> NetworkStateModel {
        self.inner.state.read().clone()
    }

    /// The flags the current state was built from, or `None` while the
    /// state is unknown.
    pub fn reachability_flags(&self) -> Option<ReachabilityFlags> {
        *self.inner.last_flags.lock()
    }

    /// Check if a network type (e.g. `"wifi"`, `"cellular"`) is available.
    ///
    /// Unrecognized type strings are never available.
    pub fn is_network_type_available(&self, type_string: &str) -> bool {
        match type_string.parse::<NetworkType>() {
            Ok(network_type) => self.inner.state.read().is_network_type_available(network_type),
            Err(err) => {
                tracing::debug!(target: targets::MANAGER, %err, "availability check for unknown type");
                false
            }
        }
    }

    /// Wi-Fi signal strength (0-100), if on Wi-Fi and known.
    pub fn network_strength(&self) -> Option<i32> {
        self.inner.state.read().details.strength
    }

    /// Check if the current network is expensive.
    pub fn is_network_expensive(&self) -> bool {
        self.inner.state.read().is_expensive
    }

    /// Check if the current network is metered.
    pub fn is_network_metered(&self) -> bool {
        self.inner.state.read().is_metered
    }

    /// Re-query reachability now and notify listeners with the result.
    ///
    /// If the source cannot report reachability the state becomes `unknown`.
    pub fn force_refresh(&self) {
        match self.inner.source.current_flags() {
            Some(flags) => self.inner.apply_flags(flags),
            None => self.inner.apply_unknown(),
        }
    }

    /// Feed a reachability snapshot from the host platform.
    ///
    /// This is the same path the OS watcher takes; hosts that receive
    /// reachability callbacks themselves can forward them here.
    pub fn handle_reachability_change(&self, flags: ReachabilityFlags) {
        self.inner.apply_flags(flags);
    }

    /// Refresh only the Wi-Fi details.
    ///
    /// Returns `true` if new details were applied, in which case listeners
    /// have been notified. A failed or timed-out lookup keeps the old values.
    pub async fn refresh_wifi_info(&self) -> bool {
        self.inner.refresh_wifi().await
    }

    /// Refresh only the Wi-Fi details without blocking, then call
    /// `completion` exactly once.
    ///
    /// `completion` runs on the async runtime, or on a helper thread when
    /// the manager has no runtime, whether or not the lookup succeeded.
    pub fn refresh_wifi_info_with_completion<F>(&self, completion: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let mut completion = Completion::new(completion);
        self.inner.spawn(async move {
            inner.refresh_wifi().await;
            completion.fire();
        });
    }

    /// Enumerate live Wi-Fi and Ethernet interfaces.
    ///
    /// Always queries the OS and works before [`start`](Self::start).
    pub fn network_interfaces(&self) -> Vec<NetworkInterfaceInfo> {
        interface::network_interfaces_with(self.inner.config.interface_filter())
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &NetworkStateConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for NetworkStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkStateManager")
            .field("state", &*self.inner.state.read())
            .field("delivery", self.inner.state_changed.delivery())
            .field("listeners", &self.listener_count())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ManagerInner {
    fn apply_flags(self: &Arc<Self>, flags: ReachabilityFlags) {
        let outbox = self.outbox.lock();
        let snapshot = {
            let mut state = self.state.write();
            let mut next = state.clone();
            next.update_from_reachability(flags);
            *state = next.clone();
            self.generation.fetch_add(1, Ordering::SeqCst);
            *self.last_flags.lock() = Some(flags);
            outbox.borrow_mut().queue.push_back(next.clone());
            next
        };

        tracing::debug!(
            target: targets::MANAGER,
            ?flags,
            network_type = %snapshot.network_type,
            connected = snapshot.is_connected,
            "network state updated"
        );
        self.deliver(&outbox);
        drop(outbox);

        if snapshot.network_type == NetworkType::Wifi && self.config.refresh_wifi_on_change {
            let inner = Arc::clone(self);
            self.spawn(async move {
                inner.refresh_wifi().await;
            });
        }
    }

    fn apply_unknown(&self) {
        let outbox = self.outbox.lock();
        {
            let mut state = self.state.write();
            *state = NetworkStateModel::default();
            self.generation.fetch_add(1, Ordering::SeqCst);
            *self.last_flags.lock() = None;
            outbox.borrow_mut().queue.push_back(state.clone());
        }

        tracing::warn!(target: targets::MANAGER, "reachability unavailable, state unknown");
        self.deliver(&outbox);
    }

    async fn refresh_wifi(&self) -> bool {
        let (network_type, started) = {
            let state = self.state.read();
            (state.network_type, self.generation.load(Ordering::SeqCst))
        };
        if network_type != NetworkType::Wifi {
            tracing::trace!(target: targets::WIFI, %network_type, "not on wifi, skipping lookup");
            return false;
        }

        let span = tracing::debug_span!(target: targets::WIFI, span_names::WIFI_REFRESH);
        let info = query_wifi(self.wifi.as_ref(), self.config.wifi_query_timeout())
            .instrument(span)
            .await;
        let Some(info) = info else {
            return false;
        };

        // Generation only moves with the outbox held, so this check stays
        // valid until the write below.
        let outbox = self.outbox.lock();
        if self.generation.load(Ordering::SeqCst) != started {
            tracing::debug!(target: targets::WIFI, "network changed during lookup, discarding");
            return false;
        }
        let snapshot = {
            let mut state = self.state.write();
            let mut next = state.clone();
            next.details.apply_wifi_info(info);
            if next == *state {
                return false;
            }
            *state = next.clone();
            outbox.borrow_mut().queue.push_back(next.clone());
            next
        };

        tracing::debug!(
            target: targets::WIFI,
            ssid = ?snapshot.details.ssid,
            strength = ?snapshot.details.strength,
            "wifi details updated"
        );
        self.deliver(&outbox);
        true
    }

    /// Emit queued snapshots in order. A nested call made while this thread
    /// is already delivering leaves its snapshot for the outer loop.
    fn deliver(&self, outbox: &RefCell<Outbox>) {
        if outbox.borrow().draining {
            return;
        }
        let _draining = Draining::begin(outbox);
        loop {
            let next = outbox.borrow_mut().queue.pop_front();
            match next {
                Some(snapshot) => {
                    self.state_changed.emit(snapshot);
                }
                None => break,
            }
        }
    }

    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self
            .runtime
            .clone()
            .or_else(|| tokio::runtime::Handle::try_current().ok());
        if let Some(handle) = handle {
            drop(handle.spawn(future));
            return;
        }

        let spawned = std::thread::Builder::new()
            .name("netstate-wifi".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(future),
                    Err(err) => {
                        tracing::warn!(target: targets::WIFI, error = %err, "could not create runtime");
                    }
                }
            });
        if let Err(err) = spawned {
            tracing::warn!(target: targets::WIFI, error = %err, "could not spawn wifi thread");
        }
    }
}

/// Snapshots written but not yet delivered.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<NetworkStateModel>,
    draining: bool,
}

/// Marks an outbox as being drained until dropped, including on unwind.
struct Draining<'a> {
    outbox: &'a RefCell<Outbox>,
}

impl<'a> Draining<'a> {
    fn begin(outbox: &'a RefCell<Outbox>) -> Self {
        outbox.borrow_mut().draining = true;
        Self { outbox }
    }
}

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.outbox.borrow_mut().draining = false;
    }
}

/// Runs a completion callback exactly once: explicitly, or when dropped
/// unfired because the task never ran to the end.
struct Completion<F: FnOnce()> {
    callback: Option<F>,
}

impl<F: FnOnce()> Completion<F> {
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    fn fire(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}

impl<F: FnOnce()> Drop for Completion<F> {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Builder for [`NetworkStateManager`].
pub struct NetworkStateManagerBuilder {
    config: NetworkStateConfig,
    delivery: DeliveryContext,
    source: Option<Arc<dyn ReachabilitySource>>,
    wifi: Option<Arc<dyn WifiInfoProvider>>,
    runtime: Option<tokio::runtime::Handle>,
}

impl NetworkStateManagerBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: NetworkStateConfig::default(),
            delivery: DeliveryContext::Direct,
            source: None,
            wifi: None,
            runtime: None,
        }
    }

    /// Use this configuration.
    pub fn config(mut self, config: NetworkStateConfig) -> Self {
        self.config = config;
        self
    }

    /// Choose where listeners are invoked.
    pub fn delivery(mut self, delivery: DeliveryContext) -> Self {
        self.delivery = delivery;
        self
    }

    /// Replace the system reachability source.
    pub fn reachability_source<S: ReachabilitySource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Replace the platform Wi-Fi lookup.
    pub fn wifi_provider<W: WifiInfoProvider + 'static>(mut self, provider: W) -> Self {
        self.wifi = Some(Arc::new(provider));
        self
    }

    /// Run Wi-Fi lookups on this runtime.
    ///
    /// Defaults to the runtime current at [`build`](Self::build) time, if any.
    pub fn runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the manager. It starts in the `unknown` state and is not yet
    /// subscribed to OS changes.
    pub fn build(self) -> Result<NetworkStateManager> {
        self.config.validate()?;

        let source = self
            .source
            .unwrap_or_else(|| Arc::new(SystemReachability::new()));
        let wifi = match self.wifi {
            Some(wifi) => wifi,
            None => default_wifi_provider(&self.config),
        };
        let runtime = self
            .runtime
            .or_else(|| tokio::runtime::Handle::try_current().ok());

        tracing::debug!(
            target: targets::MANAGER,
            delivery = ?self.delivery,
            has_runtime = runtime.is_some(),
            "building network state manager"
        );

        Ok(NetworkStateManager {
            inner: Arc::new(ManagerInner {
                state: RwLock::new(NetworkStateModel::default()),
                generation: AtomicU64::new(0),
                last_flags: Mutex::new(None),
                outbox: ReentrantMutex::new(RefCell::new(Outbox::default())),
                state_changed: Signal::with_delivery(self.delivery),
                source,
                wifi,
                config: self.config,
                runtime,
                watch: Mutex::new(None),
            }),
        })
    }
}

impl Default for NetworkStateManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
fn default_wifi_provider(config: &NetworkStateConfig) -> Arc<dyn WifiInfoProvider> {
    use crate::wifi::IwWifiProvider;

    match &config.wifi_interface {
        Some(name) => Arc::new(IwWifiProvider::with_interface(name.clone())),
        None => Arc::new(IwWifiProvider::new()),
    }
}

#[cfg(not(target_os = "linux"))]
fn default_wifi_provider(_config: &NetworkStateConfig) -> Arc<dyn WifiInfoProvider> {
    Arc::new(crate::wifi::NoWifiInfo)
}
