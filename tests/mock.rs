//! Test doubles: a scripted native engine, a PHY, an instrumented raw
//! mutex and a counting semaphore.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv6Addr;
use std::sync::{Condvar, Mutex};

use mutex::{ConstInit, ScopedRawMutex};
use nanomesh::engine::{
    AddressQuery, DeviceId, InterfaceId, MacStatistics, MeshEngine, NativeAddress, NativeError,
    NetworkStatistics, Phy, Protocol, SocketOption, SocketQuery, TaskletId, TechnologyKind,
};
use nanomesh::os::Semaphore;

thread_local! {
    /// Number of raw-mutex locks the current thread holds.
    ///
    /// The blocking-wait discipline test asserts this is zero whenever a
    /// semaphore wait begins on the same thread.
    pub static LOCKS_HELD: Cell<usize> = Cell::new(0);
}

/// Raw mutex that counts how many locks the owning thread holds.
pub struct TrackingMutex {
    inner: Mutex<()>,
}

unsafe impl ScopedRawMutex for TrackingMutex {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let guard = self.inner.lock().unwrap();
        LOCKS_HELD.with(|held| held.set(held.get() + 1));
        let result = f();
        LOCKS_HELD.with(|held| held.set(held.get() - 1));
        drop(guard);
        result
    }

    fn try_with_lock<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let guard = self.inner.try_lock().ok()?;
        LOCKS_HELD.with(|held| held.set(held.get() + 1));
        let result = f();
        LOCKS_HELD.with(|held| held.set(held.get() - 1));
        drop(guard);
        Some(result)
    }

    fn is_locked(&self) -> bool {
        match self.inner.try_lock() {
            Ok(guard) => {
                drop(guard);
                false
            }
            Err(_) => true,
        }
    }
}

impl ConstInit for TrackingMutex {
    const INIT: Self = TrackingMutex {
        inner: Mutex::new(()),
    };
}

/// Counting semaphore; asserts no lock is held when a wait begins.
pub struct TestSemaphore {
    permits: Mutex<usize>,
    wakeup: Condvar,
}

impl TestSemaphore {
    pub fn new() -> Self {
        Self {
            permits: Mutex::new(0),
            wakeup: Condvar::new(),
        }
    }
}

impl Semaphore for TestSemaphore {
    fn acquire(&self) {
        assert_eq!(
            LOCKS_HELD.with(Cell::get),
            0,
            "blocking wait entered while a stack lock is held"
        );
        let mut permits = self.permits.lock().unwrap();
        while *permits == 0 {
            permits = self.wakeup.wait(permits).unwrap();
        }
        *permits -= 1;
    }

    fn release(&self) {
        *self.permits.lock().unwrap() += 1;
        self.wakeup.notify_one();
    }
}

/// PHY driver double.
pub struct MockPhy {
    pub mac: [u8; 8],
    pub registered: bool,
}

impl MockPhy {
    pub fn new() -> Self {
        Self {
            mac: [0x02, 0, 0, 0, 0, 0, 0, 0x01],
            registered: false,
        }
    }
}

impl Phy for MockPhy {
    fn register(&mut self) -> Result<DeviceId, NativeError> {
        self.registered = true;
        Ok(DeviceId(0))
    }

    fn mac_address(&mut self) -> [u8; 8] {
        self.mac
    }
}

/// Scripted native stack.
///
/// Records every call; failure injection fields make the next matching
/// call fail once.
#[derive(Default)]
pub struct MockEngine {
    // Socket side
    pub open_ids: Vec<i8>,
    pub closed_ids: Vec<i8>,
    pub binds: Vec<(i8, NativeAddress)>,
    pub connects: Vec<(i8, NativeAddress)>,
    pub listens: Vec<(i8, u8)>,
    pub sent: Vec<(i8, Option<NativeAddress>, Vec<u8>)>,
    pub rx: HashMap<i8, VecDeque<(Vec<u8>, NativeAddress)>>,
    pub pending_accepts: VecDeque<(i8, NativeAddress)>,
    pub options: Vec<(i8, SocketOption)>,
    pub latency_ms: u32,
    pub stagger_s: u32,
    pub force_open_id: Option<i8>,
    pub fail_open: Option<NativeError>,
    pub fail_send: Option<NativeError>,
    pub send_cap: Option<usize>,

    // Event loop side
    pub tasklets: Vec<TaskletId>,
    pub timers: Vec<(TaskletId, u32)>,
    pub timer_cancels: usize,

    // Interface side
    pub created: Vec<(TechnologyKind, DeviceId)>,
    pub ups: Vec<InterfaceId>,
    pub downs: Vec<InterfaceId>,
    pub fail_interface_up: Option<NativeError>,
    pub link_local: Option<Ipv6Addr>,
    pub global: Option<Ipv6Addr>,

    // Wi-SUN configuration writes
    pub network_names: Vec<String>,
    pub regulatory_domains: Vec<(u8, u8, u8)>,
    pub channel_masks: Vec<[u32; 8]>,
    pub timings: Vec<(u16, u16, u8, u16)>,
    pub min_sens: Vec<u8>,
    pub fail_ws_config: Option<NativeError>,

    // Certificate table
    pub own_certs: Vec<(Vec<u8>, Option<Vec<u8>>)>,
    pub trusted_certs: Vec<Vec<u8>>,
    pub own_removes: usize,
    pub trusted_removes: usize,
    pub fail_cert_add: Option<NativeError>,

    // Other technologies
    pub nd_links: Vec<(InterfaceId, u8, u8, u32)>,
    pub nd_keys: Vec<Option<[u8; 16]>>,
    pub thread_devices: Vec<([u8; 8], String)>,
    pub thread_links: Vec<(u8, u16)>,

    // Statistics
    pub stats_started: Vec<InterfaceId>,
    pub mac_stats: MacStatistics,
    pub nw_stats: NetworkStatistics,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram for delivery on a socket.
    pub fn stage_rx(&mut self, id: i8, data: &[u8], from: NativeAddress) {
        self.rx
            .entry(id)
            .or_default()
            .push_back((data.to_vec(), from));
    }
}

impl MeshEngine for MockEngine {
    fn event_handler_create(&mut self) -> Result<TaskletId, NativeError> {
        let tasklet = TaskletId(self.tasklets.len() as i8 + 1);
        self.tasklets.push(tasklet);
        Ok(tasklet)
    }

    fn timer_start(&mut self, tasklet: TaskletId, after_ms: u32) -> Result<(), NativeError> {
        self.timers.push((tasklet, after_ms));
        Ok(())
    }

    fn timer_cancel(&mut self, _tasklet: TaskletId) {
        self.timer_cancels += 1;
    }

    fn interface_create(
        &mut self,
        kind: TechnologyKind,
        device: DeviceId,
    ) -> Result<InterfaceId, NativeError> {
        self.created.push((kind, device));
        Ok(InterfaceId(self.created.len() as i8))
    }

    fn interface_up(&mut self, id: InterfaceId) -> Result<(), NativeError> {
        if let Some(err) = self.fail_interface_up.take() {
            return Err(err);
        }
        self.ups.push(id);
        Ok(())
    }

    fn interface_down(&mut self, id: InterfaceId) -> Result<(), NativeError> {
        self.downs.push(id);
        Ok(())
    }

    fn address(&mut self, _id: InterfaceId, query: AddressQuery) -> Option<Ipv6Addr> {
        match query {
            AddressQuery::LinkLocal => self.link_local,
            AddressQuery::GlobalPreferred => self.global,
        }
    }

    fn ws_set_network_name(&mut self, _id: InterfaceId, name: &str) -> Result<(), NativeError> {
        if let Some(err) = self.fail_ws_config.take() {
            return Err(err);
        }
        self.network_names.push(name.to_string());
        Ok(())
    }

    fn ws_set_regulatory_domain(
        &mut self,
        _id: InterfaceId,
        domain: u8,
        operating_class: u8,
        operating_mode: u8,
    ) -> Result<(), NativeError> {
        self.regulatory_domains
            .push((domain, operating_class, operating_mode));
        Ok(())
    }

    fn ws_set_channel_mask(
        &mut self,
        _id: InterfaceId,
        mask: &[u32; 8],
    ) -> Result<(), NativeError> {
        self.channel_masks.push(*mask);
        Ok(())
    }

    fn ws_set_timing(
        &mut self,
        _id: InterfaceId,
        disc_trickle_imin: u16,
        disc_trickle_imax: u16,
        disc_trickle_k: u8,
        pan_timeout: u16,
    ) -> Result<(), NativeError> {
        self.timings
            .push((disc_trickle_imin, disc_trickle_imax, disc_trickle_k, pan_timeout));
        Ok(())
    }

    fn ws_set_device_min_sens(&mut self, _id: InterfaceId, sens: u8) -> Result<(), NativeError> {
        self.min_sens.push(sens);
        Ok(())
    }

    fn own_certificate_add(
        &mut self,
        cert: &[u8],
        key: Option<&[u8]>,
    ) -> Result<(), NativeError> {
        if let Some(err) = self.fail_cert_add.take() {
            return Err(err);
        }
        self.own_certs.push((cert.to_vec(), key.map(<[u8]>::to_vec)));
        Ok(())
    }

    fn own_certificates_remove(&mut self) -> Result<(), NativeError> {
        self.own_removes += 1;
        self.own_certs.clear();
        Ok(())
    }

    fn trusted_certificate_add(&mut self, cert: &[u8]) -> Result<(), NativeError> {
        if let Some(err) = self.fail_cert_add.take() {
            return Err(err);
        }
        self.trusted_certs.push(cert.to_vec());
        Ok(())
    }

    fn trusted_certificates_remove(&mut self) -> Result<(), NativeError> {
        self.trusted_removes += 1;
        self.trusted_certs.clear();
        Ok(())
    }

    fn nd_set_link_config(
        &mut self,
        id: InterfaceId,
        channel: u8,
        channel_page: u8,
        channel_mask: u32,
    ) -> Result<(), NativeError> {
        self.nd_links.push((id, channel, channel_page, channel_mask));
        Ok(())
    }

    fn nd_set_link_security(
        &mut self,
        _id: InterfaceId,
        psk: Option<&[u8; 16]>,
    ) -> Result<(), NativeError> {
        self.nd_keys.push(psk.copied());
        Ok(())
    }

    fn thread_set_device_config(
        &mut self,
        _id: InterfaceId,
        eui64: &[u8; 8],
        pskd: &str,
    ) -> Result<(), NativeError> {
        self.thread_devices.push((*eui64, pskd.to_string()));
        Ok(())
    }

    fn thread_set_link_config(
        &mut self,
        _id: InterfaceId,
        channel: u8,
        pan_id: u16,
    ) -> Result<(), NativeError> {
        self.thread_links.push((channel, pan_id));
        Ok(())
    }

    fn statistics_start(&mut self, id: InterfaceId) -> Result<(), NativeError> {
        self.stats_started.push(id);
        Ok(())
    }

    fn mac_statistics(&mut self) -> MacStatistics {
        self.mac_stats
    }

    fn network_statistics(&mut self) -> NetworkStatistics {
        self.nw_stats
    }

    fn socket_open(&mut self, _protocol: Protocol) -> Result<i8, NativeError> {
        if let Some(err) = self.fail_open.take() {
            return Err(err);
        }
        if let Some(id) = self.force_open_id.take() {
            return Ok(id);
        }
        let id = (0i8..).find(|id| !self.open_ids.contains(id)).unwrap();
        self.open_ids.push(id);
        Ok(id)
    }

    fn socket_close(&mut self, id: i8) -> Result<(), NativeError> {
        self.open_ids.retain(|open| *open != id);
        self.closed_ids.push(id);
        Ok(())
    }

    fn socket_bind(&mut self, id: i8, addr: &NativeAddress) -> Result<(), NativeError> {
        self.binds.push((id, *addr));
        Ok(())
    }

    fn socket_connect(&mut self, id: i8, addr: &NativeAddress) -> Result<(), NativeError> {
        self.connects.push((id, *addr));
        Ok(())
    }

    fn socket_listen(&mut self, id: i8, backlog: u8) -> Result<(), NativeError> {
        self.listens.push((id, backlog));
        Ok(())
    }

    fn socket_accept(&mut self, _id: i8) -> Result<(i8, NativeAddress), NativeError> {
        let (id, peer) = self.pending_accepts.pop_front().ok_or(NativeError::WouldBlock)?;
        self.open_ids.push(id);
        Ok((id, peer))
    }

    fn socket_send(&mut self, id: i8, data: &[u8]) -> Result<usize, NativeError> {
        if let Some(err) = self.fail_send.take() {
            return Err(err);
        }
        let accepted = self.send_cap.map_or(data.len(), |cap| cap.min(data.len()));
        self.sent.push((id, None, data[..accepted].to_vec()));
        Ok(accepted)
    }

    fn socket_sendto(
        &mut self,
        id: i8,
        addr: &NativeAddress,
        data: &[u8],
    ) -> Result<usize, NativeError> {
        if let Some(err) = self.fail_send.take() {
            return Err(err);
        }
        self.sent.push((id, Some(*addr), data.to_vec()));
        Ok(data.len())
    }

    fn socket_recv(&mut self, id: i8, buf: &mut [u8]) -> Result<usize, NativeError> {
        let (data, _) = self.take_rx(id)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn socket_recvfrom(
        &mut self,
        id: i8,
        buf: &mut [u8],
    ) -> Result<(usize, NativeAddress), NativeError> {
        let (data, from) = self.take_rx(id)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok((len, from))
    }

    fn socket_set_option(&mut self, id: i8, option: SocketOption) -> Result<(), NativeError> {
        self.options.push((id, option));
        Ok(())
    }

    fn socket_get_option(&mut self, _id: i8, query: SocketQuery) -> Result<u32, NativeError> {
        match query {
            SocketQuery::Latency => Ok(self.latency_ms),
            SocketQuery::Stagger => Ok(self.stagger_s),
        }
    }
}

impl MockEngine {
    fn take_rx(&mut self, id: i8) -> Result<(Vec<u8>, NativeAddress), NativeError> {
        self.rx
            .get_mut(&id)
            .and_then(VecDeque::pop_front)
            .ok_or(NativeError::WouldBlock)
    }
}

/// Peer address used throughout the tests.
pub fn peer(port: u16) -> NativeAddress {
    NativeAddress {
        addr: [0xfd, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
        port,
    }
}
