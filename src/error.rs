//! Error taxonomy of the adapter
//!
//! Two closed vocabularies exist side by side: the internal mesh error kind
//! used by the bring-up machinery and the configuration surface, and the
//! public socket-style error kind returned by everything an application
//! calls. All internal failures cross over through [`map_mesh_error`].

/// Internal mesh-layer error kind.
///
/// The success case is carried by `Ok(())`, not by a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeshError {
    /// A parameter was rejected
    Param,
    /// Out of memory (a bounded table or list is full)
    Memory,
    /// Operation not valid in the current connection state
    State,
    /// Unclassified failure from the native stack
    Unknown,
}

/// Public error kind of the socket and interface API.
///
/// `WOULD_BLOCK` is not part of this enum: non-blocking operations return
/// [`nb::Result`] and report it as [`nb::Error::WouldBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketError {
    /// Allocation failed (socket table or native stack heap)
    NoMemory,
    /// An argument was invalid (address family, option value, state)
    Parameter,
    /// The socket is not connected, or the interface was never brought up
    NoConnection,
    /// A connection attempt is already in progress
    Already,
    /// The socket (or interface) is already connected
    IsConnected,
    /// The native stack reported an unclassified failure
    DeviceError,
    /// The native stack does not support the requested operation
    Unsupported,
    /// No native socket was available
    NoSocket,
    /// No destination address is known for the operation
    NoAddress,
    /// The operation started and will complete asynchronously
    InProgress,
    /// The device is busy; retry later
    Busy,
}

/// Map an internal mesh error to the public vocabulary.
///
/// This is the single crossing point between the two vocabularies. The
/// mapping is total; an `Unknown` kind becomes a generic device error and
/// never a silent success.
pub fn map_mesh_error(err: MeshError) -> SocketError {
    match err {
        MeshError::Param => SocketError::Parameter,
        MeshError::Memory => SocketError::NoMemory,
        MeshError::State => SocketError::IsConnected,
        MeshError::Unknown => SocketError::DeviceError,
    }
}

impl From<MeshError> for SocketError {
    fn from(err: MeshError) -> Self {
        map_mesh_error(err)
    }
}
