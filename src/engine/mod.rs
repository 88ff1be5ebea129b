//! Black-box abstraction of the native mesh stack
//!
//! The proprietary 6LoWPAN/Thread/Wi-SUN engine is not reimplemented here;
//! it is modelled as the [`MeshEngine`] trait plus the value types it
//! exchanges with the adapter. The engine is cooperative and event-driven:
//! the adapter issues calls into it, and the event-loop glue feeds its
//! callbacks back through [`MeshStack::socket_event`] and
//! [`MeshInterface::stack_event`].
//!
//! [`MeshStack::socket_event`]: crate::stack::MeshStack::socket_event
//! [`MeshInterface::stack_event`]: crate::interface::MeshInterface::stack_event

mod traits;
mod types;

pub use traits::{MeshEngine, Phy};
pub use types::{
    AddressQuery, BootstrapEvent, DeviceId, InterfaceId, MacStatistics, NativeAddress,
    NativeError, NetworkStatistics, Protocol, SocketEventKind, SocketOption, SocketQuery,
    StackEvent, TaskletId, TechnologyKind,
};
