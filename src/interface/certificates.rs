//! Buffered Wi-SUN certificate store
//!
//! Certificates set before the interface exists are buffered here and
//! replayed into the native stack's certificate table when the bootstrap
//! is configured. The store holds references only; the certificate bytes
//! stay owned by the caller and must outlive the interface, which the
//! `'static` bound guarantees.

use heapless::Vec;

use crate::engine::MeshEngine;
use crate::error::MeshError;

use super::mesh_error_from_native;

/// Capacity of each buffered certificate list.
pub const CERTIFICATE_LIST_MAX: usize = 8;

#[derive(Debug, Clone, Copy)]
pub(crate) struct CertificateEntry {
    pub cert: &'static [u8],
    pub key: Option<&'static [u8]>,
}

/// Pending certificate operations, replayed in insertion order.
///
/// Entries are not deduplicated; removal flags are applied before the
/// buffered additions. Running out of capacity invalidates the whole
/// pending set rather than leaving it partially populated.
#[derive(Debug, Default)]
pub(crate) struct CertificateStore {
    own: Vec<CertificateEntry, CERTIFICATE_LIST_MAX>,
    trusted: Vec<CertificateEntry, CERTIFICATE_LIST_MAX>,
    remove_own: bool,
    remove_trusted: bool,
}

impl CertificateStore {
    pub const fn new() -> Self {
        Self {
            own: Vec::new(),
            trusted: Vec::new(),
            remove_own: false,
            remove_trusted: false,
        }
    }

    /// Buffer an own certificate and its optional private key.
    pub fn push_own(
        &mut self,
        cert: &'static [u8],
        key: Option<&'static [u8]>,
    ) -> Result<(), MeshError> {
        if self.own.push(CertificateEntry { cert, key }).is_err() {
            self.clear();
            return Err(MeshError::Memory);
        }
        Ok(())
    }

    /// Buffer a trusted certificate.
    pub fn push_trusted(&mut self, cert: &'static [u8]) -> Result<(), MeshError> {
        if self.trusted.push(CertificateEntry { cert, key: None }).is_err() {
            self.clear();
            return Err(MeshError::Memory);
        }
        Ok(())
    }

    /// Flag removal of all own certificates, applied before replay.
    pub fn flag_remove_own(&mut self) {
        self.remove_own = true;
    }

    /// Flag removal of all trusted certificates, applied before replay.
    pub fn flag_remove_trusted(&mut self) {
        self.remove_trusted = true;
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty() && self.trusted.is_empty() && !self.remove_own && !self.remove_trusted
    }

    /// Replay the pending set into the native certificate table.
    ///
    /// The first native rejection aborts the batch and becomes the
    /// operation's error; the store is cleared whether or not the replay
    /// succeeded; a partially applied batch is never retried.
    pub fn replay<E: MeshEngine>(&mut self, engine: &mut E) -> Result<(), MeshError> {
        let result = Self::apply(
            engine,
            self.remove_own,
            self.remove_trusted,
            &self.own,
            &self.trusted,
        );
        self.clear();
        result
    }

    fn apply<E: MeshEngine>(
        engine: &mut E,
        remove_own: bool,
        remove_trusted: bool,
        own: &[CertificateEntry],
        trusted: &[CertificateEntry],
    ) -> Result<(), MeshError> {
        if remove_own {
            engine
                .own_certificates_remove()
                .map_err(mesh_error_from_native)?;
        }
        if remove_trusted {
            engine
                .trusted_certificates_remove()
                .map_err(mesh_error_from_native)?;
        }
        for entry in own {
            engine
                .own_certificate_add(entry.cert, entry.key)
                .map_err(mesh_error_from_native)?;
        }
        for entry in trusted {
            engine
                .trusted_certificate_add(entry.cert)
                .map_err(mesh_error_from_native)?;
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.own.clear();
        self.trusted.clear();
        self.remove_own = false;
        self.remove_trusted = false;
    }
}
