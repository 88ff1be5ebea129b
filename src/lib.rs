//! Mesh network interface adapter in Rust
//!
//! This crate adapts a proprietary 6LoWPAN/Thread/Wi-SUN mesh stack to a
//! generic socket and network-interface API. The native stack itself is a
//! black box behind the [`MeshEngine`](engine::MeshEngine) trait; this
//! crate contributes what sits on top of it:
//! - the socket adapter ([`MeshStack`](stack::MeshStack)) with its fixed
//!   socket table and per-socket state machine,
//! - the per-technology bring-up state machines
//!   ([`WisunInterface`](interface::WisunInterface),
//!   [`LoWPANNDInterface`](interface::LoWPANNDInterface),
//!   [`ThreadInterface`](interface::ThreadInterface)),
//! - the single stack-wide locking discipline both are built on.
//!
//! # Example
//! ```no_run
//! use mutex::raw_impls::cs::CriticalSectionRawMutex;
//! use nanomesh::engine::Protocol;
//! use nanomesh::interface::WisunTechnology;
//! use nanomesh::{MeshInterface, MeshStack};
//!
//! # fn demo<E: nanomesh::engine::MeshEngine, P: nanomesh::engine::Phy,
//! #         S: nanomesh::os::Semaphore>(engine: E, mut phy: P, c: S, d: S) {
//! let stack: MeshStack<CriticalSectionRawMutex, E> = MeshStack::new(engine);
//!
//! let mesh = MeshInterface::new(&stack, WisunTechnology::new(), c, d);
//! mesh.initialize(&mut phy).unwrap();
//! mesh.connect().unwrap();
//!
//! let socket = stack.socket_open(Protocol::Udp).unwrap();
//! stack.socket_sendto(socket, "[fd00::1]:1234".parse().unwrap(), b"hello").unwrap();
//! # }
//! ```

#![no_std]
#![warn(missing_docs)]

/// Per-technology interface configuration
pub mod config;

/// Black-box abstraction of the native mesh stack
pub mod engine;

/// Error taxonomy and mapping
pub mod error;

/// Mesh network interfaces and bring-up state machines
pub mod interface;

/// Host-RTOS primitives consumed by the adapter
pub mod os;

/// Socket adapter over the native stack
pub mod stack;

pub use error::{map_mesh_error, MeshError, SocketError};
pub use interface::{
    ConnectionStatus, InterfaceEvent, LoWPANNDInterface, MeshInterface, StatusCallback,
    TaskletState, ThreadInterface, WisunInterface,
};
pub use stack::{MeshStack, SocketCallback, SocketEvent, SocketHandle, SocketState, SOCKETS_MAX};
