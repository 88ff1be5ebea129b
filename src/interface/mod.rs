//! Mesh network interfaces
//!
//! One generic bring-up state machine ([`MeshInterface`]) drives every
//! supported technology; what differs per technology (which native
//! configuration calls run before `interface_up`) is factored into the
//! [`Technology`] policy trait. [`WisunInterface`], [`LoWPANNDInterface`]
//! and [`ThreadInterface`] are aliases of the machine instantiated with
//! their policy, each with its own parameter surface as inherent methods.

mod certificates;
mod lowpan_nd;
mod tasklet;
mod thread;
mod wisun;

pub use certificates::CERTIFICATE_LIST_MAX;
pub use lowpan_nd::{LoWPANNDInterface, NdTechnology};
pub use tasklet::{MeshInterface, TaskletState, Technology, BOOTSTRAP_RETRY_TIMEOUT_MS};
pub use thread::{ThreadInterface, ThreadTechnology};
pub use wisun::{WisunInterface, WisunTechnology};

use crate::engine::NativeError;
use crate::error::MeshError;

/// Connection status of a mesh interface, as reported to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionStatus {
    /// Not attached to any network
    Disconnected,
    /// Bootstrap in progress
    Connecting,
    /// Attached with link-local addressing only
    LocalUp,
    /// Attached with a global prefix
    GlobalUp,
}

/// Event discriminator passed to the status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceEvent {
    /// The connection status changed
    StatusChange,
}

/// Application callback for connection status changes.
pub type StatusCallback = fn(InterfaceEvent, ConnectionStatus);

/// Internal connection events produced by the bring-up machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MeshStatus {
    Connected,
    ConnectedLocal,
    ConnectedGlobal,
    Disconnected,
    BootstrapStarted,
    BootstrapStartFailed,
    BootstrapFailed,
}

/// Classify a native failure into the mesh vocabulary.
pub(crate) fn mesh_error_from_native(err: NativeError) -> MeshError {
    match err {
        NativeError::NoMemory => MeshError::Memory,
        NativeError::Invalid => MeshError::Param,
        _ => MeshError::Unknown,
    }
}
