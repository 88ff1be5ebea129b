//! Value types shared with the native stack

use core::net::{Ipv6Addr, SocketAddr, SocketAddrV6};

/// Handle of a logical network interface inside the native stack.
///
/// Assigned when the interface is created; the original's `-1` sentinel is
/// expressed as `Option<InterfaceId>` everywhere in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceId(pub i8);

/// Handle of a registered PHY driver inside the native stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub i8);

/// Handle of an event handler registered with the native event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskletId(pub i8);

/// Transport protocol of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    /// Datagram transport
    Udp,
    /// Stream transport
    Tcp,
}

/// The native stack's IPv6-only address representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NativeAddress {
    /// Raw IPv6 address bytes
    pub addr: [u8; 16],
    /// Transport port
    pub port: u16,
}

impl NativeAddress {
    /// Translate a generic socket address.
    ///
    /// Returns `None` for anything that is not IPv6; the caller turns that
    /// into a parameter error.
    pub fn from_socket_addr(addr: &SocketAddr) -> Option<Self> {
        match addr {
            SocketAddr::V6(v6) => Some(Self {
                addr: v6.ip().octets(),
                port: v6.port(),
            }),
            SocketAddr::V4(_) => None,
        }
    }

    /// Translate back to the generic representation.
    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from(self.addr), self.port, 0, 0))
    }
}

/// Error vocabulary of the native stack.
///
/// The native API reports failures as small negative codes; this enum is
/// their typed rendition. The adapter translates them into
/// [`SocketError`](crate::error::SocketError) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NativeError {
    /// The operation would block
    WouldBlock,
    /// The native heap is exhausted
    NoMemory,
    /// No address is available for the operation
    NoAddress,
    /// The stack is busy with a conflicting operation
    Busy,
    /// The socket is not connected
    NotConnected,
    /// The request is not supported by the native stack
    Unsupported,
    /// A parameter was rejected by the native stack
    Invalid,
    /// Unclassified driver fault
    Fault,
}

/// Address query scopes understood by the native stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressQuery {
    /// Link-local address of the interface
    LinkLocal,
    /// Global-scope (preferred) address of the interface
    GlobalPreferred,
}

/// Mesh technology selected when creating a native interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TechnologyKind {
    /// Wi-SUN FAN
    Wisun,
    /// 6LoWPAN neighbour discovery
    LowpanNd,
    /// Thread
    Thread,
}

/// Events the native socket layer delivers for one socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketEventKind {
    /// Data is waiting to be read
    Data,
    /// An asynchronous connect finished successfully
    ConnectDone,
    /// An asynchronous connect failed
    ConnectFail,
    /// An asynchronous connect failed authentication
    ConnectAuthFail,
    /// A pending connection is waiting on a listening socket
    IncomingConnection,
    /// A transmission was not acknowledged
    TxFail,
    /// The peer closed the connection
    ConnectClosed,
    /// The connection was reset by the peer
    ConnectionReset,
    /// No route to the destination
    NoRoute,
    /// A transmission completed
    TxDone,
}

/// Events the native event loop delivers to a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackEvent {
    /// The handler registration completed; the stack is ready for
    /// configuration calls
    TaskletInit,
    /// A network bootstrap status change
    Bootstrap(BootstrapEvent),
    /// A timer requested through the event loop expired
    Timer,
}

/// Bootstrap status changes reported by the native stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootstrapEvent {
    /// Bootstrap finished; the interface is attached
    Ready,
    /// Network scan found no network
    ScanFail,
    /// Address allocation failed
    AddressAllocationFail,
    /// A duplicate address was detected
    DuplicateAddressDetected,
    /// Authentication with the network failed
    AuthenticationFail,
    /// Polling the parent failed
    ParentPollFail,
    /// The established connection went down
    ConnectionDown,
    /// The radio link went down
    PhyDown,
    /// An interface-down request completed
    DownComplete,
}

/// Socket options the adapter passes through to the native stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketOption {
    /// Hop limit for outgoing multicast
    MulticastHops(u8),
    /// Bind the socket to one interface
    Interface(InterfaceId),
    /// Restrict path MTU to the IPv6 minimum
    UseMinMtu(bool),
}

/// Socket properties readable from the native stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketQuery {
    /// Estimated one-way latency to the peer, in milliseconds
    Latency,
    /// Suggested stagger window for bulk transfers, in seconds
    Stagger,
}

/// MAC-layer counters kept by the native stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacStatistics {
    /// Received frames
    pub rx_count: u32,
    /// Transmitted frames
    pub tx_count: u32,
    /// Received broadcast frames
    pub bc_rx_count: u32,
    /// Transmitted broadcast frames
    pub bc_tx_count: u32,
    /// Received bytes
    pub rx_bytes: u32,
    /// Transmitted bytes
    pub tx_bytes: u32,
    /// Transmissions that ultimately failed
    pub tx_failed_count: u32,
    /// Retransmission attempts
    pub retry_count: u32,
    /// Clear-channel assessments performed
    pub cca_attempts_count: u32,
    /// Clear-channel assessments that failed
    pub failed_cca_count: u32,
}

/// Network-layer counters kept by the native stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkStatistics {
    /// Bytes of heap held by the routing protocol
    pub rpl_total_memory: u32,
    /// Expected transmission count to the primary parent, scaled by 128
    pub etx_first_parent: u16,
    /// Expected transmission count to the secondary parent, scaled by 128
    pub etx_second_parent: u16,
    /// Asynchronous frames transmitted during discovery
    pub asynch_tx_count: u32,
    /// Asynchronous frames received during discovery
    pub asynch_rx_count: u32,
}
