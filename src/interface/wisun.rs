//! Wi-SUN interface
//!
//! Wi-SUN contributes the richest bring-up policy: network name,
//! regulatory domain, channel mask, discovery timing, receiver
//! sensitivity, and the buffered certificate store that is replayed into
//! the native stack when the bootstrap is configured.

use heapless::String;
use mutex::ScopedRawMutex;

use crate::config::wisun::{
    validate_channel_mask, validate_device_min_sens, validate_network_name,
    validate_regulatory_domain, validate_timing, NETWORK_NAME_MAX,
};
use crate::config::WisunConfig;
use crate::engine::{InterfaceId, MeshEngine, TechnologyKind};
use crate::error::MeshError;
use crate::os::Semaphore;

use super::certificates::CertificateStore;
use super::mesh_error_from_native;
use super::tasklet::{MeshInterface, Technology};

/// Bring-up policy for Wi-SUN FAN.
pub struct WisunTechnology {
    pub(crate) config: WisunConfig,
    pub(crate) certs: CertificateStore,
}

impl WisunTechnology {
    /// Policy with the default Wi-SUN configuration.
    pub fn new() -> Self {
        Self::with_config(WisunConfig::default())
    }

    /// Policy with an explicit starting configuration.
    pub fn with_config(config: WisunConfig) -> Self {
        Self {
            config,
            certs: CertificateStore::new(),
        }
    }
}

impl Default for WisunTechnology {
    fn default() -> Self {
        Self::new()
    }
}

impl Technology for WisunTechnology {
    const KIND: TechnologyKind = TechnologyKind::Wisun;
    const NAME: &'static str = "Wi-SUN";

    fn configure<E: MeshEngine>(
        &mut self,
        engine: &mut E,
        id: InterfaceId,
    ) -> Result<(), MeshError> {
        engine
            .ws_set_network_name(id, self.config.network_name.as_str())
            .map_err(mesh_error_from_native)?;
        engine
            .ws_set_regulatory_domain(
                id,
                self.config.regulatory_domain,
                self.config.operating_class,
                self.config.operating_mode,
            )
            .map_err(mesh_error_from_native)?;
        engine
            .ws_set_channel_mask(id, &self.config.channel_mask)
            .map_err(mesh_error_from_native)?;
        engine
            .ws_set_timing(
                id,
                self.config.disc_trickle_imin,
                self.config.disc_trickle_imax,
                self.config.disc_trickle_k,
                self.config.pan_timeout,
            )
            .map_err(mesh_error_from_native)?;
        if self.config.device_min_sens != 0 {
            engine
                .ws_set_device_min_sens(id, self.config.device_min_sens)
                .map_err(mesh_error_from_native)?;
        }
        self.certs.replay(engine)
    }
}

/// A Wi-SUN mesh network interface.
pub type WisunInterface<'a, R, E, S> = MeshInterface<'a, R, E, WisunTechnology, S>;

impl<'a, R, E, S> MeshInterface<'a, R, E, WisunTechnology, S>
where
    R: ScopedRawMutex,
    E: MeshEngine,
    S: Semaphore,
{
    /// Set the network name. Takes effect immediately on a created
    /// interface, otherwise at the next bring-up.
    pub fn set_network_name(&self, name: &str) -> Result<(), MeshError> {
        validate_network_name(name)?;
        let mut stored: String<NETWORK_NAME_MAX> = String::new();
        stored.push_str(name).map_err(|_| MeshError::Param)?;
        self.write_through(
            |tech| tech.config.network_name = stored,
            |engine, id| engine.ws_set_network_name(id, name),
        )
    }

    /// Network name currently configured.
    pub fn network_name(&self) -> String<NETWORK_NAME_MAX> {
        self.lock(|st| st.tech.config.network_name.clone())
    }

    /// Check a network name without applying it.
    pub fn validate_network_name(&self, name: &str) -> Result<(), MeshError> {
        validate_network_name(name)
    }

    /// Set the regulatory domain, operating class and operating mode.
    pub fn set_regulatory_domain(
        &self,
        domain: u8,
        operating_class: u8,
        operating_mode: u8,
    ) -> Result<(), MeshError> {
        validate_regulatory_domain(domain, operating_class, operating_mode)?;
        self.write_through(
            |tech| {
                tech.config.regulatory_domain = domain;
                tech.config.operating_class = operating_class;
                tech.config.operating_mode = operating_mode;
            },
            |engine, id| {
                engine.ws_set_regulatory_domain(id, domain, operating_class, operating_mode)
            },
        )
    }

    /// Regulatory domain, operating class and operating mode currently
    /// configured.
    pub fn regulatory_domain(&self) -> (u8, u8, u8) {
        self.lock(|st| {
            (
                st.tech.config.regulatory_domain,
                st.tech.config.operating_class,
                st.tech.config.operating_mode,
            )
        })
    }

    /// Check a regulatory domain triple without applying it.
    pub fn validate_regulatory_domain(
        &self,
        domain: u8,
        operating_class: u8,
        operating_mode: u8,
    ) -> Result<(), MeshError> {
        validate_regulatory_domain(domain, operating_class, operating_mode)
    }

    /// Set the unicast channel mask.
    pub fn set_channel_mask(&self, mask: [u32; 8]) -> Result<(), MeshError> {
        validate_channel_mask(&mask)?;
        self.write_through(
            |tech| tech.config.channel_mask = mask,
            |engine, id| engine.ws_set_channel_mask(id, &mask),
        )
    }

    /// Unicast channel mask currently configured.
    pub fn channel_mask(&self) -> [u32; 8] {
        self.lock(|st| st.tech.config.channel_mask)
    }

    /// Check a channel mask without applying it.
    pub fn validate_channel_mask(&self, mask: &[u32; 8]) -> Result<(), MeshError> {
        validate_channel_mask(mask)
    }

    /// Set the discovery trickle timing and PAN timeout.
    pub fn set_timing_parameters(
        &self,
        disc_trickle_imin: u16,
        disc_trickle_imax: u16,
        disc_trickle_k: u8,
        pan_timeout: u16,
    ) -> Result<(), MeshError> {
        validate_timing(disc_trickle_imin, disc_trickle_imax, disc_trickle_k, pan_timeout)?;
        self.write_through(
            |tech| {
                tech.config.disc_trickle_imin = disc_trickle_imin;
                tech.config.disc_trickle_imax = disc_trickle_imax;
                tech.config.disc_trickle_k = disc_trickle_k;
                tech.config.pan_timeout = pan_timeout;
            },
            |engine, id| {
                engine.ws_set_timing(
                    id,
                    disc_trickle_imin,
                    disc_trickle_imax,
                    disc_trickle_k,
                    pan_timeout,
                )
            },
        )
    }

    /// Discovery trickle timing and PAN timeout currently configured, as
    /// `(imin, imax, k, pan_timeout)`.
    pub fn timing_parameters(&self) -> (u16, u16, u8, u16) {
        self.lock(|st| {
            (
                st.tech.config.disc_trickle_imin,
                st.tech.config.disc_trickle_imax,
                st.tech.config.disc_trickle_k,
                st.tech.config.pan_timeout,
            )
        })
    }

    /// Check timing parameters without applying them.
    pub fn validate_timing_parameters(
        &self,
        disc_trickle_imin: u16,
        disc_trickle_imax: u16,
        disc_trickle_k: u8,
        pan_timeout: u16,
    ) -> Result<(), MeshError> {
        validate_timing(disc_trickle_imin, disc_trickle_imax, disc_trickle_k, pan_timeout)
    }

    /// Set the receiver sensitivity threshold used for parent selection.
    pub fn set_device_min_sens(&self, sens: u8) -> Result<(), MeshError> {
        validate_device_min_sens(sens)?;
        self.write_through(
            |tech| tech.config.device_min_sens = sens,
            |engine, id| engine.ws_set_device_min_sens(id, sens),
        )
    }

    /// Receiver sensitivity threshold currently configured.
    pub fn device_min_sens(&self) -> u8 {
        self.lock(|st| st.tech.config.device_min_sens)
    }

    /// Check a sensitivity threshold without applying it.
    pub fn validate_device_min_sens(&self, sens: u8) -> Result<(), MeshError> {
        validate_device_min_sens(sens)
    }

    /// Provide the device's own certificate and private key.
    ///
    /// Buffered until bring-up when the interface does not exist yet,
    /// applied to the native certificate table immediately when it does.
    /// The certificate bytes stay owned by the caller.
    pub fn set_own_certificate(
        &self,
        cert: &'static [u8],
        key: Option<&'static [u8]>,
    ) -> Result<(), MeshError> {
        if cert.is_empty() {
            return Err(MeshError::Param);
        }
        let apply_now = self.lock(|st| {
            if st.interface_id.is_some() {
                Ok(true)
            } else {
                st.tech.certs.push_own(cert, key).map(|()| false)
            }
        })?;
        if apply_now {
            self.stack
                .with_engine(|e| e.own_certificate_add(cert, key))
                .map_err(mesh_error_from_native)?;
        }
        Ok(())
    }

    /// Remove all own certificates.
    ///
    /// Buffered as a removal flag applied before the next replay, or
    /// applied immediately when the interface exists.
    pub fn remove_own_certificates(&self) -> Result<(), MeshError> {
        let apply_now = self.lock(|st| {
            if st.interface_id.is_some() {
                true
            } else {
                st.tech.certs.flag_remove_own();
                false
            }
        });
        if apply_now {
            self.stack
                .with_engine(|e| e.own_certificates_remove())
                .map_err(mesh_error_from_native)?;
        }
        Ok(())
    }

    /// Add a certificate to the trusted set.
    ///
    /// Same buffering rules as [`set_own_certificate`](Self::set_own_certificate).
    pub fn set_trusted_certificate(&self, cert: &'static [u8]) -> Result<(), MeshError> {
        if cert.is_empty() {
            return Err(MeshError::Param);
        }
        let apply_now = self.lock(|st| {
            if st.interface_id.is_some() {
                Ok(true)
            } else {
                st.tech.certs.push_trusted(cert).map(|()| false)
            }
        })?;
        if apply_now {
            self.stack
                .with_engine(|e| e.trusted_certificate_add(cert))
                .map_err(mesh_error_from_native)?;
        }
        Ok(())
    }

    /// Remove all trusted certificates.
    pub fn remove_trusted_certificates(&self) -> Result<(), MeshError> {
        let apply_now = self.lock(|st| {
            if st.interface_id.is_some() {
                true
            } else {
                st.tech.certs.flag_remove_trusted();
                false
            }
        });
        if apply_now {
            self.stack
                .with_engine(|e| e.trusted_certificates_remove())
                .map_err(mesh_error_from_native)?;
        }
        Ok(())
    }

    /// Whether certificate operations are waiting for bring-up.
    pub fn has_pending_certificates(&self) -> bool {
        self.lock(|st| !st.tech.certs.is_empty())
    }
}
