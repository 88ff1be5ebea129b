//! The generic bring-up state machine
//!
//! One cooperative "tasklet" per interface drives the native bootstrap:
//! it registers an event handler with the native event loop, applies the
//! technology's pending configuration when the stack confirms readiness,
//! starts the bootstrap, and converts the stack's status events into
//! application-visible connection status changes. Failures arm a retry
//! timer until the bootstrap succeeds or the application disconnects.

use core::net::Ipv6Addr;

use log::{debug, info, warn};
use mutex::{BlockingMutex, ConstInit, ScopedRawMutex};

use crate::engine::{
    AddressQuery, BootstrapEvent, DeviceId, InterfaceId, MacStatistics, MeshEngine,
    NetworkStatistics, Phy, StackEvent, TaskletId, TechnologyKind,
};
use crate::error::{map_mesh_error, MeshError, SocketError};
use crate::os::Semaphore;
use crate::stack::MeshStack;

use super::{ConnectionStatus, InterfaceEvent, MeshStatus, StatusCallback};

/// Delay before a failed bootstrap is retried.
pub const BOOTSTRAP_RETRY_TIMEOUT_MS: u32 = 5_000;

/// Lifecycle state of the bring-up machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskletState {
    /// Nothing registered with the native event loop yet
    Created,
    /// Event handler registered; waiting for the stack's init event
    Initialized,
    /// Bootstrap running
    BootstrapStarted,
    /// Bootstrap failed; the retry timer is pending
    BootstrapFailed,
    /// Bootstrap finished; the interface is attached
    BootstrapReady,
}

/// Per-technology bring-up policy.
///
/// The state machine is identical for every mesh technology; a policy
/// contributes only the technology tag used to create the native interface
/// and the configuration calls that must run before `interface_up`.
pub trait Technology {
    /// Technology tag passed to the native interface creation.
    const KIND: TechnologyKind;

    /// Human-readable name used in log output.
    const NAME: &'static str;

    /// Push the pending configuration into the native stack.
    ///
    /// Runs every time a bootstrap is (re)started, immediately before
    /// `interface_up`.
    fn configure<E: MeshEngine>(
        &mut self,
        engine: &mut E,
        id: InterfaceId,
    ) -> Result<(), MeshError>;
}

pub(crate) struct InterfaceInner<T> {
    pub tech: T,
    pub tasklet_state: TaskletState,
    pub tasklet: Option<TaskletId>,
    pub interface_id: Option<InterfaceId>,
    pub device_id: Option<DeviceId>,
    pub mac: Option<[u8; 8]>,
    /// Current status, updated eagerly by connect()/disconnect()
    pub status: ConnectionStatus,
    /// Status as of the last event delivery; the change detector
    pub previous_status: ConnectionStatus,
    pub callback: Option<StatusCallback>,
    pub blocking: bool,
    pub statistics_enabled: bool,
}

/// Deferred work collected under the lock and performed after it.
#[derive(Default)]
pub(super) struct Notify {
    callback: Option<(StatusCallback, ConnectionStatus)>,
    release_connect: bool,
    release_disconnect: bool,
}

/// One mesh network attachment point.
///
/// Construct it with a technology policy, bind a PHY with
/// [`initialize`](Self::initialize), then drive it with
/// [`connect`](Self::connect)/[`disconnect`](Self::disconnect). The
/// event-loop glue feeds native events in through
/// [`stack_event`](Self::stack_event).
///
/// All methods take `&self`; internal state sits behind a [`BlockingMutex`]
/// of the same raw-mutex type as the stack's, and blocking waits only ever
/// happen with no lock held.
pub struct MeshInterface<'a, R, E, T, S>
where
    R: ScopedRawMutex,
    E: MeshEngine,
    T: Technology,
    S: Semaphore,
{
    pub(crate) stack: &'a MeshStack<R, E>,
    inner: BlockingMutex<R, InterfaceInner<T>>,
    connect_sem: S,
    disconnect_sem: S,
}

impl<'a, R, E, T, S> MeshInterface<'a, R, E, T, S>
where
    R: ScopedRawMutex + ConstInit,
    E: MeshEngine,
    T: Technology,
    S: Semaphore,
{
    /// Create an interface on a stack.
    ///
    /// The semaphores back the blocking connect/disconnect modes; they are
    /// only waited on when [`set_blocking`](Self::set_blocking) enabled
    /// blocking operation.
    pub fn new(stack: &'a MeshStack<R, E>, tech: T, connect_sem: S, disconnect_sem: S) -> Self {
        Self {
            stack,
            inner: BlockingMutex::new(InterfaceInner {
                tech,
                tasklet_state: TaskletState::Created,
                tasklet: None,
                interface_id: None,
                device_id: None,
                mac: None,
                status: ConnectionStatus::Disconnected,
                previous_status: ConnectionStatus::Disconnected,
                callback: None,
                blocking: true,
                statistics_enabled: false,
            }),
            connect_sem,
            disconnect_sem,
        }
    }
}

impl<'a, R, E, T, S> MeshInterface<'a, R, E, T, S>
where
    R: ScopedRawMutex,
    E: MeshEngine,
    T: Technology,
    S: Semaphore,
{
    pub(crate) fn lock<F, U>(&self, f: F) -> U
    where
        F: FnOnce(&mut InterfaceInner<T>) -> U,
    {
        self.inner.with_lock(f)
    }

    /// Bind a PHY driver to this interface.
    ///
    /// Registers the driver with the native stack and captures the device
    /// id and EUI-64. Idempotent: a second call is a no-op.
    pub fn initialize<P: Phy>(&self, phy: &mut P) -> Result<(), SocketError> {
        self.lock(|st| {
            if st.device_id.is_some() {
                return Ok(());
            }
            let device = phy.register().map_err(|_| SocketError::DeviceError)?;
            st.device_id = Some(device);
            st.mac = Some(phy.mac_address());
            debug!("{} bound to device {:?}", T::NAME, device);
            Ok(())
        })
    }

    /// Select blocking or non-blocking connect/disconnect.
    pub fn set_blocking(&self, blocking: bool) {
        self.lock(|st| st.blocking = blocking);
    }

    /// Register the status-change callback.
    pub fn attach(&self, callback: StatusCallback) {
        self.lock(|st| st.callback = Some(callback));
    }

    /// Current application-visible connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.lock(|st| st.status)
    }

    /// Current bring-up machine state.
    pub fn bootstrap_state(&self) -> TaskletState {
        self.lock(|st| st.tasklet_state)
    }

    /// Native interface id, once the interface has been created.
    pub fn interface_id(&self) -> Option<InterfaceId> {
        self.lock(|st| st.interface_id)
    }

    /// EUI-64 captured at PHY registration.
    pub fn mac_address(&self) -> Option<[u8; 8]> {
        self.lock(|st| st.mac)
    }

    /// Global-scope address, if a global prefix has been acquired.
    pub fn ip_address(&self) -> Option<Ipv6Addr> {
        let id = self.lock(|st| st.interface_id)?;
        self.stack
            .with_engine(|e| e.address(id, AddressQuery::GlobalPreferred))
    }

    /// Link-local address, once the interface is up.
    pub fn link_local_address(&self) -> Option<Ipv6Addr> {
        let id = self.lock(|st| st.interface_id)?;
        self.stack
            .with_engine(|e| e.address(id, AddressQuery::LinkLocal))
    }

    /// Bring the interface up.
    ///
    /// The first call registers the tasklet with the native event loop and
    /// waits for its init event to start the bootstrap; a reconnect reuses
    /// the registration and starts the bootstrap directly. In blocking
    /// mode the call then waits, with no lock held, until the interface
    /// first reaches a connected status; there is no timeout.
    pub fn connect(&self) -> Result<(), SocketError> {
        let (result, notify, blocking) = self.lock(|st| {
            match st.status {
                ConnectionStatus::LocalUp | ConnectionStatus::GlobalUp => {
                    return (Err(SocketError::IsConnected), Notify::default(), false)
                }
                ConnectionStatus::Connecting => {
                    return (Err(SocketError::Already), Notify::default(), false)
                }
                ConnectionStatus::Disconnected => {}
            }
            if st.device_id.is_none() {
                // No PHY bound; nothing to bring up.
                return (
                    Err(map_mesh_error(MeshError::Param)),
                    Notify::default(),
                    false,
                );
            }
            if st.tasklet.is_none() {
                let tasklet = match self.stack.with_engine(|e| e.event_handler_create()) {
                    Ok(tasklet) => tasklet,
                    Err(_) => return (Err(SocketError::DeviceError), Notify::default(), false),
                };
                st.tasklet = Some(tasklet);
                st.tasklet_state = TaskletState::Initialized;
                info!("{} tasklet registered", T::NAME);
                // Bootstrap continues when the init event arrives.
                st.status = ConnectionStatus::Connecting;
                return (Ok(()), Notify::default(), st.blocking);
            }
            // Reconnect: the event handler survives disconnects, drive the
            // bootstrap directly.
            match self.configure_and_connect(st) {
                Ok(()) => {
                    let notify = self.network_handler(st, MeshStatus::BootstrapStarted);
                    st.status = ConnectionStatus::Connecting;
                    (Ok(()), notify, st.blocking)
                }
                Err(err) => {
                    let notify = self.bootstrap_start_failed(st);
                    (Err(map_mesh_error(err)), notify, false)
                }
            }
        });
        self.dispatch(notify);
        result?;
        if blocking {
            // Wait for a connection for ever. The lock is no longer held,
            // so event delivery (which needs it) can proceed.
            self.connect_sem.acquire();
        }
        Ok(())
    }

    /// Take the interface down.
    ///
    /// Fails with [`SocketError::NoConnection`], without touching the
    /// native stack, when the interface was never brought up. Keeps the
    /// tasklet registration so a later [`connect`](Self::connect) can
    /// reuse it, and clears the status callback once the disconnect has
    /// been reported through it.
    pub fn disconnect(&self) -> Result<(), SocketError> {
        let (notify, blocking) = self.lock(|st| {
            let Some(id) = st.interface_id else {
                return Err(SocketError::NoConnection);
            };
            self.stack
                .with_engine(|e| e.interface_down(id))
                .map_err(|_| SocketError::DeviceError)?;
            if let Some(tasklet) = st.tasklet {
                self.stack.with_engine(|e| e.timer_cancel(tasklet));
            }
            st.interface_id = None;
            st.status = ConnectionStatus::Disconnected;
            let notify = self.network_handler(st, MeshStatus::Disconnected);
            st.callback = None;
            info!("{} disconnected", T::NAME);
            Ok((notify, st.blocking))
        })?;
        self.dispatch(notify);
        if blocking {
            self.disconnect_sem.acquire();
        }
        Ok(())
    }

    /// Deliver a native event-loop event to this interface's tasklet.
    ///
    /// Called by the event-loop glue. State transitions run under the
    /// interface lock; status callbacks and semaphore releases happen
    /// after it is released.
    pub fn stack_event(&self, event: StackEvent) {
        let notify = self.lock(|st| match event {
            StackEvent::TaskletInit => {
                if st.tasklet_state != TaskletState::Initialized {
                    debug!("{} ignoring stray init event", T::NAME);
                    return Notify::default();
                }
                match self.configure_and_connect(st) {
                    Ok(()) => self.network_handler(st, MeshStatus::BootstrapStarted),
                    Err(_) => self.bootstrap_start_failed(st),
                }
            }
            StackEvent::Bootstrap(_) if st.interface_id.is_none() => {
                // Torn down while the event was in flight.
                debug!("{} dropping bootstrap event after teardown", T::NAME);
                Notify::default()
            }
            StackEvent::Bootstrap(BootstrapEvent::Ready) => {
                st.tasklet_state = TaskletState::BootstrapReady;
                info!("{} bootstrap ready", T::NAME);
                self.network_handler(st, MeshStatus::Connected)
            }
            StackEvent::Bootstrap(BootstrapEvent::DownComplete) => {
                // Interface-down completion is reported synchronously from
                // disconnect(); nothing left to do here.
                Notify::default()
            }
            StackEvent::Bootstrap(failure) => {
                warn!("{} bootstrap failure: {:?}", T::NAME, failure);
                st.tasklet_state = TaskletState::BootstrapFailed;
                self.arm_retry_timer(st);
                self.network_handler(st, MeshStatus::BootstrapFailed)
            }
            StackEvent::Timer => {
                let retry = st.tasklet_state != TaskletState::BootstrapReady
                    && st.tasklet_state != TaskletState::BootstrapStarted
                    && st.interface_id.is_some();
                if !retry {
                    return Notify::default();
                }
                debug!("{} bootstrap retry", T::NAME);
                match self.configure_and_connect(st) {
                    Ok(()) => self.network_handler(st, MeshStatus::BootstrapStarted),
                    Err(_) => self.bootstrap_start_failed(st),
                }
            }
        });
        self.dispatch(notify);
    }

    /// Start statistics collection for this interface.
    pub fn enable_statistics(&self) -> Result<(), MeshError> {
        self.lock(|st| {
            let id = st.interface_id.ok_or(MeshError::State)?;
            self.stack
                .with_engine(|e| e.statistics_start(id))
                .map_err(|_| MeshError::Unknown)?;
            st.statistics_enabled = true;
            Ok(())
        })
    }

    /// Read the MAC counters; statistics collection must be enabled.
    pub fn mac_statistics(&self) -> Result<MacStatistics, MeshError> {
        self.lock(|st| {
            if !st.statistics_enabled {
                return Err(MeshError::State);
            }
            Ok(self.stack.with_engine(|e| e.mac_statistics()))
        })
    }

    /// Read the network counters; statistics collection must be enabled.
    pub fn network_statistics(&self) -> Result<NetworkStatistics, MeshError> {
        self.lock(|st| {
            if !st.statistics_enabled {
                return Err(MeshError::State);
            }
            Ok(self.stack.with_engine(|e| e.network_statistics()))
        })
    }

    /// Update the pending configuration and, when the native interface
    /// already exists, write the value through immediately.
    ///
    /// A write-through on a bootstrapped interface restarts the native
    /// bootstrap; the machine drops back to `BootstrapStarted` and reports
    /// it through the status handler, where the suppression rules keep the
    /// reconfiguration blip from reaching the application.
    pub(super) fn write_through<Set, Push>(&self, set: Set, push: Push) -> Result<(), MeshError>
    where
        Set: FnOnce(&mut T),
        Push: FnOnce(&mut E, InterfaceId) -> Result<(), crate::engine::NativeError>,
    {
        let (result, notify) = self.lock(|st| {
            set(&mut st.tech);
            let Some(id) = st.interface_id else {
                return (Ok(()), Notify::default());
            };
            match self.stack.with_engine(|e| push(e, id)) {
                Ok(()) => {
                    if st.tasklet_state == TaskletState::BootstrapReady {
                        st.tasklet_state = TaskletState::BootstrapStarted;
                        (Ok(()), self.network_handler(st, MeshStatus::BootstrapStarted))
                    } else {
                        (Ok(()), Notify::default())
                    }
                }
                Err(err) => (Err(super::mesh_error_from_native(err)), Notify::default()),
            }
        });
        self.dispatch(notify);
        result
    }

    /// Apply the technology configuration and start the bootstrap.
    fn configure_and_connect(&self, st: &mut InterfaceInner<T>) -> Result<(), MeshError> {
        let device = st.device_id.ok_or(MeshError::Param)?;
        let id = match st.interface_id {
            Some(id) => id,
            None => {
                let id = self
                    .stack
                    .with_engine(|e| e.interface_create(T::KIND, device))
                    .map_err(super::mesh_error_from_native)?;
                st.interface_id = Some(id);
                debug!("{} interface {:?} created", T::NAME, id);
                id
            }
        };
        let tech = &mut st.tech;
        self.stack.with_engine(|e| {
            tech.configure(e, id)?;
            e.interface_up(id).map_err(super::mesh_error_from_native)
        })?;
        st.tasklet_state = TaskletState::BootstrapStarted;
        info!("{} bootstrap started", T::NAME);
        Ok(())
    }

    /// Record a failed bootstrap start and arm the retry timer.
    fn bootstrap_start_failed(&self, st: &mut InterfaceInner<T>) -> Notify {
        warn!("{} bootstrap start failed", T::NAME);
        st.tasklet_state = TaskletState::BootstrapFailed;
        self.arm_retry_timer(st);
        self.network_handler(st, MeshStatus::BootstrapStartFailed)
    }

    fn arm_retry_timer(&self, st: &mut InterfaceInner<T>) {
        let (Some(tasklet), Some(_)) = (st.tasklet, st.interface_id) else {
            return;
        };
        if let Err(err) = self
            .stack
            .with_engine(|e| e.timer_start(tasklet, BOOTSTRAP_RETRY_TIMEOUT_MS))
        {
            warn!("{} retry timer failed to arm: {:?}", T::NAME, err);
        }
    }

    /// Map an internal connection event to the public status, decide
    /// whether the callback fires, and update the change detector.
    ///
    /// The two suppression conditions are deliberate and load-bearing; do
    /// not fold them into the inequality check.
    pub(super) fn network_handler(&self, st: &mut InterfaceInner<T>, event: MeshStatus) -> Notify {
        let mapped = match event {
            MeshStatus::Connected => {
                // A global prefix shows up as a global-scope address that
                // differs from the link-local one.
                let addrs = st.interface_id.map(|id| {
                    self.stack.with_engine(|e| {
                        (
                            e.address(id, AddressQuery::LinkLocal),
                            e.address(id, AddressQuery::GlobalPreferred),
                        )
                    })
                });
                match addrs {
                    Some((Some(link_local), Some(global))) if link_local != global => {
                        ConnectionStatus::GlobalUp
                    }
                    _ => ConnectionStatus::LocalUp,
                }
            }
            MeshStatus::ConnectedLocal => ConnectionStatus::LocalUp,
            MeshStatus::ConnectedGlobal => ConnectionStatus::GlobalUp,
            MeshStatus::BootstrapStarted | MeshStatus::BootstrapFailed => {
                ConnectionStatus::Connecting
            }
            MeshStatus::Disconnected | MeshStatus::BootstrapStartFailed => {
                ConnectionStatus::Disconnected
            }
        };

        let release_connect = st.blocking
            && matches!(
                event,
                MeshStatus::Connected | MeshStatus::ConnectedLocal | MeshStatus::ConnectedGlobal
            );
        let release_disconnect = st.blocking && event == MeshStatus::Disconnected;

        let suppressed = (st.previous_status == ConnectionStatus::GlobalUp
            && event == MeshStatus::BootstrapStarted)
            || (event == MeshStatus::BootstrapStartFailed
                && st.previous_status == ConnectionStatus::Connecting);
        let callback = if mapped != st.previous_status && !suppressed {
            st.callback.map(|cb| (cb, mapped))
        } else {
            None
        };

        st.status = mapped;
        st.previous_status = mapped;

        Notify {
            callback,
            release_connect,
            release_disconnect,
        }
    }

    /// Run the deferred notifications with no lock held.
    pub(super) fn dispatch(&self, notify: Notify) {
        if notify.release_connect {
            self.connect_sem.release();
        }
        if let Some((callback, status)) = notify.callback {
            callback(InterfaceEvent::StatusChange, status);
        }
        if notify.release_disconnect {
            self.disconnect_sem.release();
        }
    }
}
