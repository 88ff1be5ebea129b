//! Wi-SUN interface configuration

use heapless::String;

use crate::error::MeshError;

/// Maximum length of a Wi-SUN network name, in bytes.
pub const NETWORK_NAME_MAX: usize = 32;

/// Wi-SUN configuration held by the interface until bring-up.
///
/// Values set before `connect()` are pushed into the native stack when the
/// bootstrap is configured; values set while the interface exists are
/// written through immediately (which may restart the bootstrap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WisunConfig {
    /// UTF-8 network name, 1–32 bytes
    pub network_name: String<NETWORK_NAME_MAX>,
    /// Regulatory domain identifier
    pub regulatory_domain: u8,
    /// Operating class within the regulatory domain
    pub operating_class: u8,
    /// Operating mode (data-rate/modulation profile)
    pub operating_mode: u8,
    /// Unicast channel mask, 256 channels
    pub channel_mask: [u32; 8],
    /// Discovery trickle Imin, seconds
    pub disc_trickle_imin: u16,
    /// Discovery trickle Imax, seconds
    pub disc_trickle_imax: u16,
    /// Discovery trickle redundancy constant
    pub disc_trickle_k: u8,
    /// PAN timeout, seconds
    pub pan_timeout: u16,
    /// Minimum receiver sensitivity accepted for parent selection;
    /// 0 leaves the stack default in place
    pub device_min_sens: u8,
}

impl Default for WisunConfig {
    fn default() -> Self {
        let mut network_name = String::new();
        // Cannot overflow: the literal is shorter than NETWORK_NAME_MAX.
        let _ = network_name.push_str("Wi-SUN Network");
        Self {
            network_name,
            regulatory_domain: 3,
            operating_class: 2,
            operating_mode: 3,
            channel_mask: [0xffff_ffff; 8],
            disc_trickle_imin: 15,
            disc_trickle_imax: 60,
            disc_trickle_k: 1,
            pan_timeout: 3800,
            device_min_sens: 0,
        }
    }
}

/// Check a network name without applying it.
pub fn validate_network_name(name: &str) -> Result<(), MeshError> {
    if name.is_empty() || name.len() > NETWORK_NAME_MAX {
        return Err(MeshError::Param);
    }
    Ok(())
}

/// Check a regulatory domain / operating class / operating mode triple.
pub fn validate_regulatory_domain(
    domain: u8,
    operating_class: u8,
    operating_mode: u8,
) -> Result<(), MeshError> {
    if domain > 7 {
        return Err(MeshError::Param);
    }
    if !(1..=4).contains(&operating_class) {
        return Err(MeshError::Param);
    }
    if !(1..=5).contains(&operating_mode) {
        return Err(MeshError::Param);
    }
    Ok(())
}

/// Check a unicast channel mask; at least one channel must be enabled.
pub fn validate_channel_mask(mask: &[u32; 8]) -> Result<(), MeshError> {
    if mask.iter().all(|word| *word == 0) {
        return Err(MeshError::Param);
    }
    Ok(())
}

/// Check discovery trickle timing and PAN timeout.
pub fn validate_timing(
    disc_trickle_imin: u16,
    disc_trickle_imax: u16,
    disc_trickle_k: u8,
    pan_timeout: u16,
) -> Result<(), MeshError> {
    if disc_trickle_imin == 0 || disc_trickle_imax < disc_trickle_imin {
        return Err(MeshError::Param);
    }
    if disc_trickle_k == 0 {
        return Err(MeshError::Param);
    }
    if pan_timeout < 60 {
        return Err(MeshError::Param);
    }
    Ok(())
}

/// Check a device sensitivity threshold.
pub fn validate_device_min_sens(sens: u8) -> Result<(), MeshError> {
    if sens == u8::MAX {
        return Err(MeshError::Param);
    }
    Ok(())
}
