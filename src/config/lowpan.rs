//! 6LoWPAN-ND interface configuration

use crate::error::MeshError;

/// 6LoWPAN-ND configuration held by the interface until bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowpanNdConfig {
    /// Radio channel; the valid range depends on the channel page
    pub channel: u8,
    /// IEEE 802.15.4 channel page
    pub channel_page: u8,
    /// Scan mask over the page's channels
    pub channel_mask: u32,
    /// Link-layer security key; `None` disables link security
    pub psk: Option<[u8; 16]>,
}

impl Default for LowpanNdConfig {
    fn default() -> Self {
        Self {
            channel: 12,
            channel_page: 0,
            channel_mask: 0x07ff_f800,
            psk: None,
        }
    }
}

/// Check a channel / page combination without applying it.
pub fn validate_link_config(channel: u8, channel_page: u8) -> Result<(), MeshError> {
    match channel_page {
        0 if channel <= 26 => Ok(()),
        2 if channel <= 10 => Ok(()),
        _ => Err(MeshError::Param),
    }
}
