//! Error mapping, address translation and configuration validation

use std::net::SocketAddr;

use nanomesh::config::{lowpan, thread, wisun, LowpanNdConfig, ThreadConfig, WisunConfig};
use nanomesh::engine::NativeAddress;
use nanomesh::{map_mesh_error, MeshError, SocketError};

#[test]
fn mesh_error_mapping_is_total_and_documented() {
    assert_eq!(map_mesh_error(MeshError::Param), SocketError::Parameter);
    assert_eq!(map_mesh_error(MeshError::Memory), SocketError::NoMemory);
    assert_eq!(map_mesh_error(MeshError::State), SocketError::IsConnected);
    assert_eq!(map_mesh_error(MeshError::Unknown), SocketError::DeviceError);
}

#[test]
fn mesh_error_converts_through_from() {
    let err: SocketError = MeshError::Memory.into();
    assert_eq!(err, SocketError::NoMemory);
}

#[test]
fn native_address_translation_is_ipv6_only() {
    let v6: SocketAddr = "[fd00::2a]:1700".parse().unwrap();
    let native = NativeAddress::from_socket_addr(&v6).unwrap();
    assert_eq!(native.port, 1700);
    assert_eq!(native.addr[0], 0xfd);
    assert_eq!(native.to_socket_addr(), v6);

    let v4: SocketAddr = "192.0.2.1:1700".parse().unwrap();
    assert!(NativeAddress::from_socket_addr(&v4).is_none());
}

#[test]
fn wisun_defaults_pass_their_own_validation() {
    let config = WisunConfig::default();
    wisun::validate_network_name(&config.network_name).unwrap();
    wisun::validate_regulatory_domain(
        config.regulatory_domain,
        config.operating_class,
        config.operating_mode,
    )
    .unwrap();
    wisun::validate_channel_mask(&config.channel_mask).unwrap();
    wisun::validate_timing(
        config.disc_trickle_imin,
        config.disc_trickle_imax,
        config.disc_trickle_k,
        config.pan_timeout,
    )
    .unwrap();
}

#[test]
fn wisun_validation_boundaries() {
    assert_eq!(wisun::validate_network_name(""), Err(MeshError::Param));
    assert!(wisun::validate_network_name(&"n".repeat(32)).is_ok());
    assert_eq!(
        wisun::validate_network_name(&"n".repeat(33)),
        Err(MeshError::Param)
    );

    assert!(wisun::validate_regulatory_domain(7, 4, 5).is_ok());
    assert_eq!(
        wisun::validate_regulatory_domain(8, 1, 1),
        Err(MeshError::Param)
    );
    assert_eq!(
        wisun::validate_regulatory_domain(0, 0, 1),
        Err(MeshError::Param)
    );

    assert_eq!(wisun::validate_channel_mask(&[0; 8]), Err(MeshError::Param));
    let mut one = [0u32; 8];
    one[7] = 1 << 31;
    assert!(wisun::validate_channel_mask(&one).is_ok());

    assert_eq!(wisun::validate_timing(0, 60, 1, 3800), Err(MeshError::Param));
    assert_eq!(wisun::validate_timing(15, 14, 1, 3800), Err(MeshError::Param));
    assert_eq!(wisun::validate_timing(15, 60, 0, 3800), Err(MeshError::Param));
    assert_eq!(wisun::validate_timing(15, 60, 1, 59), Err(MeshError::Param));

    assert!(wisun::validate_device_min_sens(0).is_ok());
    assert_eq!(wisun::validate_device_min_sens(255), Err(MeshError::Param));
}

#[test]
fn lowpan_validation_depends_on_channel_page() {
    let config = LowpanNdConfig::default();
    lowpan::validate_link_config(config.channel, config.channel_page).unwrap();

    assert!(lowpan::validate_link_config(26, 0).is_ok());
    assert_eq!(lowpan::validate_link_config(27, 0), Err(MeshError::Param));
    assert!(lowpan::validate_link_config(10, 2).is_ok());
    assert_eq!(lowpan::validate_link_config(11, 2), Err(MeshError::Param));
    assert_eq!(lowpan::validate_link_config(0, 1), Err(MeshError::Param));
}

#[test]
fn thread_validation_boundaries() {
    let config = ThreadConfig::default();
    thread::validate_pskd(&config.pskd).unwrap();
    thread::validate_channel(config.channel).unwrap();

    assert_eq!(thread::validate_pskd("12345"), Err(MeshError::Param));
    assert!(thread::validate_pskd("123456").is_ok());
    assert_eq!(thread::validate_channel(10), Err(MeshError::Param));
    assert_eq!(thread::validate_channel(27), Err(MeshError::Param));
    assert!(thread::validate_channel(11).is_ok());
}
