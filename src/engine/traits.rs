//! Traits over the native mesh stack and the radio driver

use core::net::Ipv6Addr;

use super::types::{
    AddressQuery, DeviceId, InterfaceId, MacStatistics, NativeAddress, NativeError,
    NetworkStatistics, Protocol, SocketOption, SocketQuery, TaskletId, TechnologyKind,
};

/// The native mesh stack.
///
/// This is the boundary to the proprietary, event-driven network engine:
/// the adapter drives it through these calls and receives its callbacks as
/// [`StackEvent`](super::StackEvent)/[`SocketEventKind`](super::SocketEventKind) deliveries.
/// Every method is expected to be called with the stack lock held, which
/// the adapter guarantees by construction: the engine is only reachable
/// from inside the lock.
///
/// Implementations bind these methods to the real stack's C entry points;
/// tests substitute a scripted mock.
pub trait MeshEngine {
    /// Register an event handler with the native event loop.
    ///
    /// The stack confirms the registration asynchronously by delivering
    /// [`StackEvent::TaskletInit`](super::StackEvent::TaskletInit) to the new handler.
    fn event_handler_create(&mut self) -> Result<TaskletId, NativeError>;

    /// Arm a one-shot timer; expiry is delivered as [`StackEvent::Timer`](super::StackEvent::Timer).
    fn timer_start(&mut self, tasklet: TaskletId, after_ms: u32) -> Result<(), NativeError>;

    /// Cancel a previously armed timer, if still pending.
    fn timer_cancel(&mut self, tasklet: TaskletId);

    /// Create a logical network interface on a registered PHY.
    fn interface_create(
        &mut self,
        kind: TechnologyKind,
        device: DeviceId,
    ) -> Result<InterfaceId, NativeError>;

    /// Start the bootstrap of a created interface.
    fn interface_up(&mut self, id: InterfaceId) -> Result<(), NativeError>;

    /// Take a bootstrapped interface down.
    fn interface_down(&mut self, id: InterfaceId) -> Result<(), NativeError>;

    /// Read one of the interface's addresses.
    ///
    /// `None` when no address of the requested scope exists yet; that is an
    /// expected condition during bootstrap, not an error.
    fn address(&mut self, id: InterfaceId, query: AddressQuery) -> Option<Ipv6Addr>;

    /// Set the Wi-SUN network name.
    fn ws_set_network_name(&mut self, id: InterfaceId, name: &str) -> Result<(), NativeError>;

    /// Set the Wi-SUN regulatory domain, operating class and operating mode.
    fn ws_set_regulatory_domain(
        &mut self,
        id: InterfaceId,
        domain: u8,
        operating_class: u8,
        operating_mode: u8,
    ) -> Result<(), NativeError>;

    /// Set the Wi-SUN unicast channel mask.
    fn ws_set_channel_mask(
        &mut self,
        id: InterfaceId,
        mask: &[u32; 8],
    ) -> Result<(), NativeError>;

    /// Set the Wi-SUN discovery trickle timing and PAN timeout.
    fn ws_set_timing(
        &mut self,
        id: InterfaceId,
        disc_trickle_imin: u16,
        disc_trickle_imax: u16,
        disc_trickle_k: u8,
        pan_timeout: u16,
    ) -> Result<(), NativeError>;

    /// Set the receiver sensitivity threshold used for parent selection.
    fn ws_set_device_min_sens(&mut self, id: InterfaceId, sens: u8) -> Result<(), NativeError>;

    /// Add an own certificate (with optional private key) to the stack's
    /// certificate table.
    fn own_certificate_add(
        &mut self,
        cert: &[u8],
        key: Option<&[u8]>,
    ) -> Result<(), NativeError>;

    /// Remove all own certificates from the stack's certificate table.
    fn own_certificates_remove(&mut self) -> Result<(), NativeError>;

    /// Add a trusted certificate to the stack's certificate table.
    fn trusted_certificate_add(&mut self, cert: &[u8]) -> Result<(), NativeError>;

    /// Remove all trusted certificates from the stack's certificate table.
    fn trusted_certificates_remove(&mut self) -> Result<(), NativeError>;

    /// Set the 6LoWPAN-ND link configuration.
    fn nd_set_link_config(
        &mut self,
        id: InterfaceId,
        channel: u8,
        channel_page: u8,
        channel_mask: u32,
    ) -> Result<(), NativeError>;

    /// Set the 6LoWPAN-ND link-layer security key, or disable security.
    fn nd_set_link_security(
        &mut self,
        id: InterfaceId,
        psk: Option<&[u8; 16]>,
    ) -> Result<(), NativeError>;

    /// Set the Thread device configuration.
    fn thread_set_device_config(
        &mut self,
        id: InterfaceId,
        eui64: &[u8; 8],
        pskd: &str,
    ) -> Result<(), NativeError>;

    /// Set the Thread link configuration.
    fn thread_set_link_config(
        &mut self,
        id: InterfaceId,
        channel: u8,
        pan_id: u16,
    ) -> Result<(), NativeError>;

    /// Start statistics collection for an interface.
    fn statistics_start(&mut self, id: InterfaceId) -> Result<(), NativeError>;

    /// Read the MAC-layer counters.
    fn mac_statistics(&mut self) -> MacStatistics;

    /// Read the network-layer counters.
    fn network_statistics(&mut self) -> NetworkStatistics;

    /// Open a native socket; returns the native socket id.
    fn socket_open(&mut self, protocol: Protocol) -> Result<i8, NativeError>;

    /// Close a native socket.
    fn socket_close(&mut self, id: i8) -> Result<(), NativeError>;

    /// Bind a native socket to a local address.
    fn socket_bind(&mut self, id: i8, addr: &NativeAddress) -> Result<(), NativeError>;

    /// Start connecting a native socket to a peer.
    fn socket_connect(&mut self, id: i8, addr: &NativeAddress) -> Result<(), NativeError>;

    /// Put a native stream socket into the listening state.
    fn socket_listen(&mut self, id: i8, backlog: u8) -> Result<(), NativeError>;

    /// Take one pending connection off a listening socket.
    fn socket_accept(&mut self, id: i8) -> Result<(i8, NativeAddress), NativeError>;

    /// Send on a connected socket; may write fewer bytes than requested on
    /// stream sockets.
    fn socket_send(&mut self, id: i8, data: &[u8]) -> Result<usize, NativeError>;

    /// Send a datagram to an explicit destination.
    fn socket_sendto(
        &mut self,
        id: i8,
        addr: &NativeAddress,
        data: &[u8],
    ) -> Result<usize, NativeError>;

    /// Receive from a connected socket.
    fn socket_recv(&mut self, id: i8, buf: &mut [u8]) -> Result<usize, NativeError>;

    /// Receive one datagram and its source address.
    fn socket_recvfrom(
        &mut self,
        id: i8,
        buf: &mut [u8],
    ) -> Result<(usize, NativeAddress), NativeError>;

    /// Set a socket option.
    fn socket_set_option(&mut self, id: i8, option: SocketOption) -> Result<(), NativeError>;

    /// Read a socket property.
    fn socket_get_option(&mut self, id: i8, query: SocketQuery) -> Result<u32, NativeError>;
}

/// A radio driver registerable with the native stack.
///
/// The driver itself is opaque; the adapter only needs the registration
/// handshake and the EUI-64 it will report for the interface.
pub trait Phy {
    /// Register the driver with the stack, obtaining a device id.
    fn register(&mut self) -> Result<DeviceId, NativeError>;

    /// EUI-64 of the radio.
    fn mac_address(&mut self) -> [u8; 8];
}
