//! Thread interface

use heapless::String;
use mutex::ScopedRawMutex;

use crate::config::thread::{validate_channel, validate_pskd, PSKD_MAX};
use crate::config::ThreadConfig;
use crate::engine::{InterfaceId, MeshEngine, TechnologyKind};
use crate::error::MeshError;
use crate::os::Semaphore;

use super::mesh_error_from_native;
use super::tasklet::{MeshInterface, Technology};

/// Bring-up policy for Thread.
pub struct ThreadTechnology {
    pub(crate) config: ThreadConfig,
}

impl ThreadTechnology {
    /// Policy with the default Thread configuration.
    pub fn new() -> Self {
        Self::with_config(ThreadConfig::default())
    }

    /// Policy with an explicit starting configuration.
    pub fn with_config(config: ThreadConfig) -> Self {
        Self { config }
    }
}

impl Default for ThreadTechnology {
    fn default() -> Self {
        Self::new()
    }
}

impl Technology for ThreadTechnology {
    const KIND: TechnologyKind = TechnologyKind::Thread;
    const NAME: &'static str = "Thread";

    fn configure<E: MeshEngine>(
        &mut self,
        engine: &mut E,
        id: InterfaceId,
    ) -> Result<(), MeshError> {
        engine
            .thread_set_device_config(id, &self.config.eui64, self.config.pskd.as_str())
            .map_err(mesh_error_from_native)?;
        engine
            .thread_set_link_config(id, self.config.channel, self.config.pan_id)
            .map_err(mesh_error_from_native)
    }
}

/// A Thread mesh network interface.
pub type ThreadInterface<'a, R, E, S> = MeshInterface<'a, R, E, ThreadTechnology, S>;

impl<'a, R, E, S> MeshInterface<'a, R, E, ThreadTechnology, S>
where
    R: ScopedRawMutex,
    E: MeshEngine,
    S: Semaphore,
{
    /// Set the commissioning identity (EUI-64 and joining credential).
    pub fn set_device_config(&self, eui64: [u8; 8], pskd: &str) -> Result<(), MeshError> {
        validate_pskd(pskd)?;
        let mut stored: String<PSKD_MAX> = String::new();
        stored.push_str(pskd).map_err(|_| MeshError::Param)?;
        self.write_through(
            |tech| {
                tech.config.eui64 = eui64;
                tech.config.pskd = stored;
            },
            |engine, id| engine.thread_set_device_config(id, &eui64, pskd),
        )
    }

    /// Commissioning EUI-64 currently configured.
    pub fn device_eui64(&self) -> [u8; 8] {
        self.lock(|st| st.tech.config.eui64)
    }

    /// Check a joining credential without applying it.
    pub fn validate_device_config(&self, pskd: &str) -> Result<(), MeshError> {
        validate_pskd(pskd)
    }

    /// Set the radio channel and PAN id.
    pub fn set_link_config(&self, channel: u8, pan_id: u16) -> Result<(), MeshError> {
        validate_channel(channel)?;
        self.write_through(
            |tech| {
                tech.config.channel = channel;
                tech.config.pan_id = pan_id;
            },
            |engine, id| engine.thread_set_link_config(id, channel, pan_id),
        )
    }

    /// Radio channel and PAN id currently configured.
    pub fn link_config(&self) -> (u8, u16) {
        self.lock(|st| (st.tech.config.channel, st.tech.config.pan_id))
    }
}
