//! 6LoWPAN-ND interface

use mutex::ScopedRawMutex;

use crate::config::lowpan::validate_link_config;
use crate::config::LowpanNdConfig;
use crate::engine::{InterfaceId, MeshEngine, TechnologyKind};
use crate::error::MeshError;
use crate::os::Semaphore;

use super::mesh_error_from_native;
use super::tasklet::{MeshInterface, Technology};

/// Bring-up policy for 6LoWPAN neighbour discovery.
pub struct NdTechnology {
    pub(crate) config: LowpanNdConfig,
}

impl NdTechnology {
    /// Policy with the default 6LoWPAN-ND configuration.
    pub fn new() -> Self {
        Self::with_config(LowpanNdConfig::default())
    }

    /// Policy with an explicit starting configuration.
    pub fn with_config(config: LowpanNdConfig) -> Self {
        Self { config }
    }
}

impl Default for NdTechnology {
    fn default() -> Self {
        Self::new()
    }
}

impl Technology for NdTechnology {
    const KIND: TechnologyKind = TechnologyKind::LowpanNd;
    const NAME: &'static str = "6LoWPAN-ND";

    fn configure<E: MeshEngine>(
        &mut self,
        engine: &mut E,
        id: InterfaceId,
    ) -> Result<(), MeshError> {
        engine
            .nd_set_link_config(
                id,
                self.config.channel,
                self.config.channel_page,
                self.config.channel_mask,
            )
            .map_err(mesh_error_from_native)?;
        engine
            .nd_set_link_security(id, self.config.psk.as_ref())
            .map_err(mesh_error_from_native)
    }
}

/// A 6LoWPAN-ND mesh network interface.
pub type LoWPANNDInterface<'a, R, E, S> = MeshInterface<'a, R, E, NdTechnology, S>;

impl<'a, R, E, S> MeshInterface<'a, R, E, NdTechnology, S>
where
    R: ScopedRawMutex,
    E: MeshEngine,
    S: Semaphore,
{
    /// Set the radio channel and channel page.
    pub fn set_link_config(&self, channel: u8, channel_page: u8) -> Result<(), MeshError> {
        validate_link_config(channel, channel_page)?;
        let mask = self.lock(|st| st.tech.config.channel_mask);
        self.write_through(
            |tech| {
                tech.config.channel = channel;
                tech.config.channel_page = channel_page;
            },
            |engine, id| engine.nd_set_link_config(id, channel, channel_page, mask),
        )
    }

    /// Radio channel and channel page currently configured.
    pub fn link_config(&self) -> (u8, u8) {
        self.lock(|st| (st.tech.config.channel, st.tech.config.channel_page))
    }

    /// Check a channel / page combination without applying it.
    pub fn validate_link_config(&self, channel: u8, channel_page: u8) -> Result<(), MeshError> {
        validate_link_config(channel, channel_page)
    }

    /// Set the scan mask over the page's channels.
    pub fn set_channel_mask(&self, mask: u32) -> Result<(), MeshError> {
        if mask == 0 {
            return Err(MeshError::Param);
        }
        let (channel, page) = self.lock(|st| (st.tech.config.channel, st.tech.config.channel_page));
        self.write_through(
            |tech| tech.config.channel_mask = mask,
            |engine, id| engine.nd_set_link_config(id, channel, page, mask),
        )
    }

    /// Scan mask currently configured.
    pub fn channel_mask(&self) -> u32 {
        self.lock(|st| st.tech.config.channel_mask)
    }

    /// Set or clear the link-layer security key.
    pub fn set_link_security(&self, psk: Option<[u8; 16]>) -> Result<(), MeshError> {
        self.write_through(
            |tech| tech.config.psk = psk,
            |engine, id| engine.nd_set_link_security(id, psk.as_ref()),
        )
    }
}
