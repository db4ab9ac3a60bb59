//! Identities shared by the demo server and client

#![allow(dead_code)]

use dcerpc::Uuid;
use dcom::types::{Ipid, Oid, Oxid};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12360;

/// Exporter hosting both demo objects
pub const DEMO_OXID: Oxid = Oxid(0x0000_0000_0dc0_0001);

/// The CA view object
pub const CERT_VIEW_OID: Oid = Oid(0x0000_0000_0000_0c01);
/// The IIS services object
pub const IIS_OID: Oid = Oid(0x0000_0000_0000_0115);

/// IUnknown of the CA view object; clients query it for ICertView.
pub const CERT_VIEW_UNKNOWN: Ipid = Ipid(Uuid::from_fields(
    0x0c01_0000,
    0,
    0,
    [0xd0, 0x0c, 0, 0, 0, 0, 0, 0x01],
));

/// IUnknown of the IIS services object.
pub const IIS_UNKNOWN: Ipid = Ipid(Uuid::from_fields(
    0x0115_0000,
    0,
    0,
    [0xd0, 0x0c, 0, 0, 0, 0, 0, 0x02],
));

/// IRemUnknown of the exporter.
pub const REM_UNKNOWN: Ipid = Ipid(Uuid::from_fields(
    0x0131_0000,
    0,
    0,
    [0xd0, 0x0c, 0, 0, 0, 0, 0, 0x03],
));

pub const CERT_VIEW_IPID: Ipid = Ipid(Uuid::from_fields(
    0x0c01_0001,
    0,
    0,
    [0xd0, 0x0c, 0, 0, 0, 0, 0, 0x04],
));

pub const IIS_IPID: Ipid = Ipid(Uuid::from_fields(
    0x0115_0001,
    0,
    0,
    [0xd0, 0x0c, 0, 0, 0, 0, 0, 0x05],
));

/// Service names reported by `Status`
pub const IIS_SERVICES: [&str; 3] = ["W3SVC", "MSFTPSVC", "SMTPSVC"];

/// `SERVICE_STOPPED`
pub const SERVICE_STOPPED: u32 = 1;
/// `SERVICE_RUNNING`
pub const SERVICE_RUNNING: u32 = 4;

/// Status buffer layout used by the demo: per service a little-endian
/// state, a character count, then the UTF-16LE name.
pub fn encode_status(services: &[(&str, u32)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, state) in services {
        let name: Vec<u16> = name.encode_utf16().collect();
        buf.extend_from_slice(&state.to_le_bytes());
        buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buf.extend(name.iter().flat_map(|c| c.to_le_bytes()));
    }
    buf
}

/// Parse up to `count` records; a truncated buffer yields the complete
/// ones only.
pub fn decode_status(buf: &[u8], count: usize) -> Vec<(String, u32)> {
    let mut services = Vec::new();
    let mut rest = buf;
    while services.len() < count && rest.len() >= 8 {
        let state = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let len = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let Some(name) = rest.get(8..8 + len * 2) else {
            break;
        };
        let units: Vec<u16> = name.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
        services.push((String::from_utf16_lossy(&units), state));
        rest = &rest[8 + len * 2..];
    }
    services
}
