//! Socket table entries and the per-socket state machine

use crate::engine::{NativeAddress, NativeError, Protocol};
use crate::error::SocketError;

/// Size of the socket table. The native stack never hands out ids at or
/// above this value; one that does trips an invariant panic in the adapter.
pub const SOCKETS_MAX: usize = 16;

/// Opaque handle to one adapter socket.
///
/// Handles are invalidated by [`MeshStack::socket_close`]; using a handle
/// after closing it is a programming error and panics.
///
/// [`MeshStack::socket_close`]: crate::stack::MeshStack::socket_close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketHandle(pub(crate) u8);

impl SocketHandle {
    /// Native socket id behind this handle.
    pub fn id(&self) -> u8 {
        self.0
    }
}

/// Lifecycle state of one socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketState {
    /// Stream socket opened, neither connecting nor listening
    Opened,
    /// Datagram socket; stays here for its whole life
    Datagram,
    /// Stream socket with a connect in flight
    Connecting,
    /// Connected stream socket
    Stream,
    /// Listening stream socket
    Listening,
    /// Closed by an asynchronous event; the slot is held until the
    /// application closes the handle
    Closed,
}

/// Events delivered through the per-socket callback.
///
/// One callback slot exists per socket and events are not queued; the
/// callback is expected to re-query socket state to decide what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketEvent {
    /// Data is available to read
    DataReady,
    /// A transmission completed
    TxDone,
    /// A transmission failed; fatal for stream sockets only
    TxFailed,
    /// An asynchronous connect completed
    ConnectDone,
    /// An asynchronous connect failed
    ConnectFailed,
    /// The peer reset or closed the connection
    ConnectionReset,
    /// A pending connection is waiting to be accepted
    IncomingConnection,
    /// The socket was closed
    Closed,
}

/// The single per-socket event callback.
pub type SocketCallback = fn(SocketHandle, SocketEvent);

/// One occupied slot of the socket table.
///
/// The protocol is implicit in the state: a datagram socket never leaves
/// [`SocketState::Datagram`], every other state is a stream socket.
pub(crate) struct SocketEntry {
    pub state: SocketState,
    /// Default peer recorded by a datagram connect
    pub remote: Option<NativeAddress>,
    pub callback: Option<SocketCallback>,
}

impl SocketEntry {
    pub fn new(proto: Protocol) -> Self {
        Self {
            state: match proto {
                Protocol::Udp => SocketState::Datagram,
                Protocol::Tcp => SocketState::Opened,
            },
            remote: None,
            callback: None,
        }
    }
}

/// Translate the native error vocabulary into the public one.
pub(crate) fn map_native_error(err: NativeError) -> nb::Error<SocketError> {
    match err {
        NativeError::WouldBlock => nb::Error::WouldBlock,
        NativeError::NoMemory => nb::Error::Other(SocketError::NoMemory),
        NativeError::NoAddress => nb::Error::Other(SocketError::NoAddress),
        NativeError::Busy => nb::Error::Other(SocketError::Busy),
        NativeError::NotConnected => nb::Error::Other(SocketError::NoConnection),
        NativeError::Unsupported => nb::Error::Other(SocketError::Unsupported),
        NativeError::Invalid => nb::Error::Other(SocketError::Parameter),
        NativeError::Fault => nb::Error::Other(SocketError::DeviceError),
    }
}

/// As [`map_native_error`], for operations that have no would-block path.
pub(crate) fn map_native_error_sync(err: NativeError) -> SocketError {
    match map_native_error(err) {
        nb::Error::WouldBlock => SocketError::Busy,
        nb::Error::Other(e) => e,
    }
}
