//! The socket adapter over the native mesh stack
//!
//! [`MeshStack`] is the crate's core. It is intended to be placed in a
//! `static` (or any location that outlives the interfaces borrowing it)
//! and owns two things behind one [`BlockingMutex`]: the native engine and
//! the fixed-size socket table. Every socket operation and every native
//! event delivery locks that mutex; engine state is only reachable from
//! inside the lock, so "the lock is held" is a fact the compiler enforces
//! rather than an assertion.
//!
//! Event callbacks registered with [`MeshStack::socket_attach`] are fired
//! *after* the lock is released, so a callback may call straight back into
//! the adapter.

mod socket;

use core::net::SocketAddr;

use log::{debug, warn};
use mutex::{BlockingMutex, ConstInit, ScopedRawMutex};

use crate::engine::{MeshEngine, NativeAddress, Protocol, SocketEventKind, SocketOption, SocketQuery};
use crate::error::SocketError;
use socket::{map_native_error, map_native_error_sync, SocketEntry};
pub use socket::{SocketCallback, SocketEvent, SocketHandle, SocketState, SOCKETS_MAX};

/// The socket adapter and owner of the native engine.
pub struct MeshStack<R: ScopedRawMutex, E: MeshEngine> {
    inner: BlockingMutex<R, StackInner<E>>,
}

struct StackInner<E> {
    engine: E,
    sockets: [Option<SocketEntry>; SOCKETS_MAX],
}

impl<E> StackInner<E> {
    const VACANT: Option<SocketEntry> = None;

    const fn new(engine: E) -> Self {
        Self {
            engine,
            sockets: [Self::VACANT; SOCKETS_MAX],
        }
    }
}

impl<R, E> MeshStack<R, E>
where
    R: ScopedRawMutex + ConstInit,
    E: MeshEngine,
{
    /// Create a stack around a native engine.
    ///
    /// `const`, so the stack can live in a `static`:
    ///
    /// ```ignore
    /// static STACK: MeshStack<CriticalSectionRawMutex, NativeEngine> =
    ///     MeshStack::new(NativeEngine::new());
    /// ```
    pub const fn new(engine: E) -> Self {
        Self {
            inner: BlockingMutex::new(StackInner::new(engine)),
        }
    }
}

impl<R, E> MeshStack<R, E>
where
    R: ScopedRawMutex,
    E: MeshEngine,
{
    /// As [`MeshStack::new`], for raw mutexes without a `const` initializer.
    pub const fn const_new(raw: R, engine: E) -> Self {
        Self {
            inner: BlockingMutex::const_new(raw, StackInner::new(engine)),
        }
    }

    /// Access the native engine under the stack lock.
    ///
    /// The mutex is held for the duration of the closure; do not block in
    /// it. This is the escape hatch event-loop glue and the interface
    /// machinery use to drive the engine.
    pub fn with_engine<F, U>(&self, f: F) -> U
    where
        F: FnOnce(&mut E) -> U,
    {
        self.inner.with_lock(|inner| f(&mut inner.engine))
    }

    fn lock<F, U>(&self, f: F) -> U
    where
        F: FnOnce(&mut StackInner<E>) -> U,
    {
        self.inner.with_lock(f)
    }

    /// Open a socket.
    ///
    /// A UDP socket starts in [`SocketState::Datagram`], a TCP socket in
    /// [`SocketState::Opened`].
    ///
    /// # Panics
    ///
    /// Panics if the native stack hands out an id outside the socket table
    /// or an id whose slot is already occupied; both are invariant
    /// violations, not recoverable errors.
    pub fn socket_open(&self, protocol: Protocol) -> Result<SocketHandle, SocketError> {
        self.lock(|inner| {
            let id = inner
                .engine
                .socket_open(protocol)
                .map_err(map_native_error_sync)?;
            let idx = usize::try_from(id).ok().filter(|i| *i < SOCKETS_MAX);
            let Some(idx) = idx else {
                panic!("native socket id {} outside the socket table", id);
            };
            if inner.sockets[idx].is_some() {
                panic!("native socket id {} is already occupied", id);
            }
            inner.sockets[idx] = Some(SocketEntry::new(protocol));
            debug!("socket {} open ({:?})", id, protocol);
            Ok(SocketHandle(idx as u8))
        })
    }

    /// Close a socket and invalidate its handle.
    ///
    /// The registered event callback is fired (with [`SocketEvent::Closed`])
    /// even for this application-initiated close, so upper layers observe
    /// completion uniformly. A socket that was already torn down by an
    /// asynchronous event is freed without a second notification.
    ///
    /// # Panics
    ///
    /// Panics if the handle was closed before; close is exactly-once by
    /// contract.
    pub fn socket_close(&self, handle: SocketHandle) -> Result<(), SocketError> {
        let idx = handle.0 as usize;
        let fire = self.lock(|inner| {
            let Some(entry) = inner.sockets[idx].as_mut() else {
                panic!("socket {} closed twice", handle.0);
            };
            if entry.state == SocketState::Closed {
                // Torn down by an event earlier; the event already notified.
                inner.sockets[idx] = None;
                return Ok::<_, SocketError>(None);
            }
            inner
                .engine
                .socket_close(idx as i8)
                .map_err(map_native_error_sync)?;
            let callback = entry.callback;
            inner.sockets[idx] = None;
            debug!("socket {} closed", handle.0);
            Ok(callback)
        })?;
        if let Some(callback) = fire {
            callback(handle, SocketEvent::Closed);
        }
        Ok(())
    }

    /// Bind a socket to a local address. IPv6 (or the IPv6 wildcard) only.
    pub fn socket_bind(&self, handle: SocketHandle, addr: SocketAddr) -> Result<(), SocketError> {
        let native = NativeAddress::from_socket_addr(&addr).ok_or(SocketError::Parameter)?;
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            match entry.state {
                SocketState::Opened | SocketState::Datagram => {}
                _ => return Err(SocketError::Parameter),
            }
            inner
                .engine
                .socket_bind(handle.0 as i8, &native)
                .map_err(map_native_error_sync)
        })
    }

    /// Connect a socket to a peer.
    ///
    /// For TCP the call starts an asynchronous connect: the socket moves to
    /// [`SocketState::Connecting`] and the call reports
    /// [`SocketError::InProgress`]; completion arrives later through the
    /// event callback. For UDP the call merely records the default peer and
    /// succeeds immediately.
    pub fn socket_connect(
        &self,
        handle: SocketHandle,
        addr: SocketAddr,
    ) -> Result<(), SocketError> {
        let native = NativeAddress::from_socket_addr(&addr).ok_or(SocketError::Parameter)?;
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            match entry.state {
                SocketState::Closed => return Err(SocketError::NoConnection),
                SocketState::Connecting => return Err(SocketError::Already),
                SocketState::Stream => return Err(SocketError::IsConnected),
                SocketState::Listening => return Err(SocketError::Parameter),
                SocketState::Datagram => {
                    entry.remote = Some(native);
                    return Ok(());
                }
                SocketState::Opened => {}
            }
            inner
                .engine
                .socket_connect(handle.0 as i8, &native)
                .map_err(map_native_error_sync)?;
            let entry = entry_mut(&mut inner.sockets, handle);
            entry.remote = Some(native);
            entry.state = SocketState::Connecting;
            debug!("socket {} connecting", handle.0);
            Err(SocketError::InProgress)
        })
    }

    /// Put a stream socket into the listening state.
    pub fn socket_listen(&self, handle: SocketHandle, backlog: u8) -> Result<(), SocketError> {
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            if entry.state != SocketState::Opened {
                return Err(SocketError::Parameter);
            }
            inner
                .engine
                .socket_listen(handle.0 as i8, backlog)
                .map_err(map_native_error_sync)?;
            entry_mut(&mut inner.sockets, handle).state = SocketState::Listening;
            Ok(())
        })
    }

    /// Take one pending connection off a listening socket.
    ///
    /// Non-blocking: reports [`nb::Error::WouldBlock`] when nothing is
    /// pending. On success the new socket is already in
    /// [`SocketState::Stream`].
    ///
    /// # Panics
    ///
    /// Panics if the native stack hands the accepted connection an id that
    /// collides with an occupied table slot.
    pub fn socket_accept(
        &self,
        handle: SocketHandle,
    ) -> nb::Result<(SocketHandle, SocketAddr), SocketError> {
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            if entry.state != SocketState::Listening {
                return Err(nb::Error::Other(SocketError::Parameter));
            }
            let (id, peer) = inner
                .engine
                .socket_accept(handle.0 as i8)
                .map_err(map_native_error)?;
            let idx = usize::try_from(id).ok().filter(|i| *i < SOCKETS_MAX);
            let Some(idx) = idx else {
                panic!("native socket id {} outside the socket table", id);
            };
            if inner.sockets[idx].is_some() {
                panic!("native socket id {} is already occupied", id);
            }
            let mut entry = SocketEntry::new(Protocol::Tcp);
            entry.state = SocketState::Stream;
            entry.remote = Some(peer);
            inner.sockets[idx] = Some(entry);
            debug!("socket {} accepted as {}", handle.0, idx);
            Ok((SocketHandle(idx as u8), peer.to_socket_addr()))
        })
    }

    /// Send on a connected socket.
    ///
    /// Stream sockets may accept fewer bytes than offered; datagram sends
    /// are all-or-nothing. A datagram socket with no recorded peer reports
    /// [`SocketError::NoAddress`].
    pub fn socket_send(&self, handle: SocketHandle, data: &[u8]) -> nb::Result<usize, SocketError> {
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            match entry.state {
                SocketState::Stream => inner
                    .engine
                    .socket_send(handle.0 as i8, data)
                    .map_err(map_native_error),
                SocketState::Datagram => {
                    let remote = entry.remote.ok_or(nb::Error::Other(SocketError::NoAddress))?;
                    inner
                        .engine
                        .socket_sendto(handle.0 as i8, &remote, data)
                        .map_err(map_native_error)
                }
                SocketState::Listening => Err(nb::Error::Other(SocketError::Parameter)),
                _ => Err(nb::Error::Other(SocketError::NoConnection)),
            }
        })
    }

    /// Send a datagram to an explicit destination.
    ///
    /// On a connected stream socket the address is ignored and the data
    /// goes out on the stream.
    pub fn socket_sendto(
        &self,
        handle: SocketHandle,
        addr: SocketAddr,
        data: &[u8],
    ) -> nb::Result<usize, SocketError> {
        let native =
            NativeAddress::from_socket_addr(&addr).ok_or(nb::Error::Other(SocketError::Parameter))?;
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            match entry.state {
                SocketState::Datagram => inner
                    .engine
                    .socket_sendto(handle.0 as i8, &native, data)
                    .map_err(map_native_error),
                SocketState::Stream => inner
                    .engine
                    .socket_send(handle.0 as i8, data)
                    .map_err(map_native_error),
                SocketState::Listening => Err(nb::Error::Other(SocketError::Parameter)),
                _ => Err(nb::Error::Other(SocketError::NoConnection)),
            }
        })
    }

    /// Receive from a connected socket.
    pub fn socket_recv(
        &self,
        handle: SocketHandle,
        buf: &mut [u8],
    ) -> nb::Result<usize, SocketError> {
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            match entry.state {
                SocketState::Stream | SocketState::Datagram => inner
                    .engine
                    .socket_recv(handle.0 as i8, buf)
                    .map_err(map_native_error),
                SocketState::Listening => Err(nb::Error::Other(SocketError::Parameter)),
                _ => Err(nb::Error::Other(SocketError::NoConnection)),
            }
        })
    }

    /// Receive one datagram and its source address.
    ///
    /// On a stream socket this behaves as [`MeshStack::socket_recv`] and
    /// reports the connected peer as the source.
    pub fn socket_recvfrom(
        &self,
        handle: SocketHandle,
        buf: &mut [u8],
    ) -> nb::Result<(usize, SocketAddr), SocketError> {
        self.lock(|inner| {
            let entry = entry_mut(&mut inner.sockets, handle);
            match entry.state {
                SocketState::Datagram => {
                    let (n, from) = inner
                        .engine
                        .socket_recvfrom(handle.0 as i8, buf)
                        .map_err(map_native_error)?;
                    Ok((n, from.to_socket_addr()))
                }
                SocketState::Stream => {
                    let peer = entry.remote.ok_or(nb::Error::Other(SocketError::NoAddress))?;
                    let n = inner
                        .engine
                        .socket_recv(handle.0 as i8, buf)
                        .map_err(map_native_error)?;
                    Ok((n, peer.to_socket_addr()))
                }
                SocketState::Listening => Err(nb::Error::Other(SocketError::Parameter)),
                _ => Err(nb::Error::Other(SocketError::NoConnection)),
            }
        })
    }

    /// Register the single per-socket event callback.
    ///
    /// Later events replace nothing and queue nothing: the one callback is
    /// invoked for every event and re-queries state via
    /// [`MeshStack::socket_state`].
    pub fn socket_attach(&self, handle: SocketHandle, callback: SocketCallback) {
        self.lock(|inner| {
            entry_mut(&mut inner.sockets, handle).callback = Some(callback);
        });
    }

    /// Set a socket option.
    pub fn socket_set_option(
        &self,
        handle: SocketHandle,
        option: SocketOption,
    ) -> Result<(), SocketError> {
        self.lock(|inner| {
            entry_mut(&mut inner.sockets, handle);
            inner
                .engine
                .socket_set_option(handle.0 as i8, option)
                .map_err(map_native_error_sync)
        })
    }

    /// Read a socket property.
    pub fn socket_get_option(
        &self,
        handle: SocketHandle,
        query: SocketQuery,
    ) -> Result<u32, SocketError> {
        self.lock(|inner| {
            entry_mut(&mut inner.sockets, handle);
            inner
                .engine
                .socket_get_option(handle.0 as i8, query)
                .map_err(map_native_error_sync)
        })
    }

    /// Current state of a socket, or `None` once the slot was freed.
    pub fn socket_state(&self, handle: SocketHandle) -> Option<SocketState> {
        self.lock(|inner| inner.sockets[handle.0 as usize].as_ref().map(|e| e.state))
    }

    /// Deliver a native socket event.
    ///
    /// Called by the event-loop glue for every callback the native stack
    /// raises. Events for ids the adapter no longer tracks are dropped;
    /// the native close path can race an application close and that is
    /// legitimate. State transitions happen under the lock; the application
    /// callback fires after it is released.
    pub fn socket_event(&self, socket_id: i8, kind: SocketEventKind) {
        let idx = usize::try_from(socket_id).ok().filter(|i| *i < SOCKETS_MAX);
        let Some(idx) = idx else {
            warn!("socket event for id {} outside the table", socket_id);
            return;
        };
        let fire = self.lock(|inner| {
            let Some(entry) = inner.sockets[idx].as_ref() else {
                debug!("socket event {:?} for freed id {}", kind, socket_id);
                return None;
            };
            let state = entry.state;
            let callback = entry.callback;
            let event = match kind {
                SocketEventKind::Data => SocketEvent::DataReady,
                SocketEventKind::TxDone => SocketEvent::TxDone,
                SocketEventKind::IncomingConnection => SocketEvent::IncomingConnection,
                SocketEventKind::ConnectDone => {
                    if state == SocketState::Connecting {
                        set_state(inner, idx, SocketState::Stream);
                    }
                    SocketEvent::ConnectDone
                }
                SocketEventKind::ConnectFail | SocketEventKind::ConnectAuthFail => {
                    if state == SocketState::Connecting {
                        close_on_event(inner, idx);
                    }
                    SocketEvent::ConnectFailed
                }
                SocketEventKind::ConnectClosed | SocketEventKind::ConnectionReset => {
                    if matches!(state, SocketState::Stream | SocketState::Connecting) {
                        close_on_event(inner, idx);
                    }
                    SocketEvent::ConnectionReset
                }
                SocketEventKind::TxFail | SocketEventKind::NoRoute => {
                    // Fatal on an established stream, tolerated on datagram
                    // sockets: datagram transport is expected to survive
                    // individual send failures.
                    if state == SocketState::Stream {
                        close_on_event(inner, idx);
                    }
                    SocketEvent::TxFailed
                }
            };
            callback.map(|cb| (cb, event))
        });
        if let Some((callback, event)) = fire {
            callback(SocketHandle(idx as u8), event);
        }
    }
}

/// Resolve a handle to its table entry.
///
/// A vacant slot means the caller kept a handle past its close; that is a
/// programming error, mirroring the original's null-handle assertion.
fn entry_mut(
    sockets: &mut [Option<SocketEntry>; SOCKETS_MAX],
    handle: SocketHandle,
) -> &mut SocketEntry {
    sockets[handle.0 as usize]
        .as_mut()
        .unwrap_or_else(|| panic!("stale socket handle {}", handle.0))
}

fn set_state<E>(inner: &mut StackInner<E>, idx: usize, state: SocketState) {
    if let Some(entry) = inner.sockets[idx].as_mut() {
        entry.state = state;
    }
}

/// Event-driven teardown: close the native socket but keep the slot so the
/// application's own close can still find it.
fn close_on_event<E: MeshEngine>(inner: &mut StackInner<E>, idx: usize) {
    if let Err(err) = inner.engine.socket_close(idx as i8) {
        warn!("native close of socket {} failed: {:?}", idx, err);
    }
    if let Some(entry) = inner.sockets[idx].as_mut() {
        entry.state = SocketState::Closed;
    }
    debug!("socket {} closed by event", idx);
}
