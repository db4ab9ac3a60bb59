//! DCE RPC PDU (Protocol Data Unit) types
//!
//! This module implements the connection-oriented DCE RPC wire format as
//! defined in:
//! - DCE 1.1: Remote Procedure Call (C706), chapter 12
//! - MS-RPCE: Remote Procedure Call Protocol Extensions
//!
//! DCE RPC PDU Header Format:
//! ```text
//! +--------+--------+--------+--------+
//! |  vers  |vers_min| ptype  | pflags |
//! +--------+--------+--------+--------+
//! |        data representation        |
//! +--------+--------+--------+--------+
//! |   frag_len      |   auth_len      |
//! +--------+--------+--------+--------+
//! |             call_id               |
//! +--------+--------+--------+--------+
//! ```
//!
//! PDU bodies follow NDR alignment rules relative to the start of the PDU.
//! The header is 16 bytes long, so bodies are encoded with an
//! [`NdrWriter`] and appended to the header without shifting alignment.

use crate::error::{Result, RpcError};
use bytes::{BufMut, Bytes, BytesMut};
use midl_ndr::{NdrContext, NdrDecode, NdrEncode, NdrReader, NdrWriter};

/// DCE RPC protocol version
pub const DCE_RPC_VERSION: u8 = 5;
/// DCE RPC protocol minor version
pub const DCE_RPC_VERSION_MINOR: u8 = 0;

/// Fragment size every implementation must accept (C706 12.6.3.1).
pub const MUST_RECV_FRAG_SIZE: u16 = 1432;

/// Default fragment size negotiated by Windows peers.
pub const DEFAULT_MAX_FRAG: u16 = 4280;

/// DCE RPC packet types used on connection-oriented transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Request = 0,
    Response = 2,
    Fault = 3,
    Bind = 11,
    BindAck = 12,
    BindNak = 13,
    AlterContext = 14,
    AlterContextResp = 15,
    Shutdown = 17,
    CoCancel = 18,
    Orphaned = 19,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Request),
            2 => Some(Self::Response),
            3 => Some(Self::Fault),
            11 => Some(Self::Bind),
            12 => Some(Self::BindAck),
            13 => Some(Self::BindNak),
            14 => Some(Self::AlterContext),
            15 => Some(Self::AlterContextResp),
            17 => Some(Self::Shutdown),
            18 => Some(Self::CoCancel),
            19 => Some(Self::Orphaned),
            _ => None,
        }
    }
}

/// Packet flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketFlags(u8);

impl PacketFlags {
    pub const FIRST_FRAG: u8 = 0x01;
    pub const LAST_FRAG: u8 = 0x02;
    pub const PENDING_CANCEL: u8 = 0x04;
    /// Supports concurrent multiplexing
    pub const CONC_MPX: u8 = 0x10;
    pub const DID_NOT_EXECUTE: u8 = 0x20;
    pub const MAYBE: u8 = 0x40;
    /// The request body carries an object UUID
    pub const OBJECT_UUID: u8 = 0x80;

    pub fn new() -> Self {
        Self(0)
    }

    /// Single-fragment PDU.
    pub fn complete() -> Self {
        Self(Self::FIRST_FRAG | Self::LAST_FRAG)
    }

    pub fn set_first_frag(&mut self) -> &mut Self {
        self.0 |= Self::FIRST_FRAG;
        self
    }

    pub fn set_last_frag(&mut self) -> &mut Self {
        self.0 |= Self::LAST_FRAG;
        self
    }

    pub fn is_first_frag(&self) -> bool {
        self.0 & Self::FIRST_FRAG != 0
    }

    pub fn is_last_frag(&self) -> bool {
        self.0 & Self::LAST_FRAG != 0
    }

    pub fn has_object_uuid(&self) -> bool {
        self.0 & Self::OBJECT_UUID != 0
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn from_u8(value: u8) -> Self {
        Self(value)
    }
}

/// Data Representation Format Label (MS-RPCE 2.2.2.3)
///
/// - Byte 0: bits 4-7 integer representation, bits 0-3 character set
/// - Byte 1: floating point representation
/// - Bytes 2-3: reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRepresentation {
    pub int_rep: IntRep,
    pub char_rep: CharRep,
    pub float_rep: FloatRep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntRep {
    BigEndian = 0,
    LittleEndian = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharRep {
    Ascii = 0,
    Ebcdic = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatRep {
    Ieee = 0,
    Vax = 1,
    Cray = 2,
    Ibm = 3,
}

impl DataRepresentation {
    /// Little-endian, ASCII, IEEE: `[0x10, 0x00, 0x00, 0x00]`
    pub fn ndr() -> Self {
        Self {
            int_rep: IntRep::LittleEndian,
            char_rep: CharRep::Ascii,
            float_rep: FloatRep::Ieee,
        }
    }

    pub fn big_endian() -> Self {
        Self {
            int_rep: IntRep::BigEndian,
            ..Self::ndr()
        }
    }

    pub fn encode(&self) -> [u8; 4] {
        let byte0 = (self.char_rep as u8) | ((self.int_rep as u8) << 4);
        [byte0, self.float_rep as u8, 0, 0]
    }

    pub fn decode(data: [u8; 4]) -> Self {
        let int_rep = if data[0] & 0xF0 == 0 {
            IntRep::BigEndian
        } else {
            IntRep::LittleEndian
        };
        let char_rep = if data[0] & 0x0F == 0 {
            CharRep::Ascii
        } else {
            CharRep::Ebcdic
        };
        let float_rep = match data[1] {
            0 => FloatRep::Ieee,
            1 => FloatRep::Vax,
            2 => FloatRep::Cray,
            _ => FloatRep::Ibm,
        };
        Self {
            int_rep,
            char_rep,
            float_rep,
        }
    }

    pub fn is_little_endian(&self) -> bool {
        self.int_rep == IntRep::LittleEndian
    }

    /// NDR context for stub data sent with this label.
    pub fn ndr_context(&self) -> NdrContext {
        NdrContext::with_byte_order(self.is_little_endian())
    }
}

impl Default for DataRepresentation {
    fn default() -> Self {
        Self::ndr()
    }
}

/// UUID in its DCE field layout.
///
/// The first three fields follow the data representation byte order on the
/// wire; the clock sequence and node are plain bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub struct Uuid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_and_version: u16,
    pub clock_seq_hi_and_reserved: u8,
    pub clock_seq_low: u8,
    pub node: [u8; 6],
}

impl Uuid {
    pub const NIL: Self = Self::from_fields(0, 0, 0, [0; 8]);

    /// Build a UUID in a `const` context. `tail` holds the clock sequence
    /// followed by the node, exactly as written in the string form.
    pub const fn from_fields(time_low: u32, time_mid: u16, time_hi_and_version: u16, tail: [u8; 8]) -> Self {
        Self {
            time_low,
            time_mid,
            time_hi_and_version,
            clock_seq_hi_and_reserved: tail[0],
            clock_seq_low: tail[1],
            node: [tail[2], tail[3], tail[4], tail[5], tail[6], tail[7]],
        }
    }

    /// Parse from string format "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
    /// optionally wrapped in braces.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('{').trim_end_matches('}');
        let parts: Vec<&str> = s.split('-').collect();
        if s.len() != 36 || parts.len() != 5 || parts[3].len() != 4 || parts[4].len() != 12 {
            return None;
        }

        let time_low = u32::from_str_radix(parts[0], 16).ok()?;
        let time_mid = u16::from_str_radix(parts[1], 16).ok()?;
        let time_hi_and_version = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;
        let mut tail = [0u8; 8];
        tail[..2].copy_from_slice(&clock.to_be_bytes());
        for (i, slot) in tail[2..].iter_mut().enumerate() {
            *slot = u8::from_str_radix(parts[4].get(i * 2..i * 2 + 2)?, 16).ok()?;
        }
        Some(Self::from_fields(time_low, time_mid, time_hi_and_version, tail))
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// 16 bytes in the little-endian (Windows GUID) layout.
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.time_low.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.time_mid.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.time_hi_and_version.to_le_bytes());
        bytes[8] = self.clock_seq_hi_and_reserved;
        bytes[9] = self.clock_seq_low;
        bytes[10..16].copy_from_slice(&self.node);
        bytes
    }

    pub fn from_bytes_le(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; 16] = bytes.get(..16)?.try_into().ok()?;
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&bytes[8..]);
        Some(Self::from_fields(
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            u16::from_le_bytes([bytes[4], bytes[5]]),
            u16::from_le_bytes([bytes[6], bytes[7]]),
            tail,
        ))
    }
}

impl std::fmt::Display for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            self.time_low,
            self.time_mid,
            self.time_hi_and_version,
            self.clock_seq_hi_and_reserved,
            self.clock_seq_low,
        )?;
        self.node.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

impl std::str::FromStr for Uuid {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| RpcError::InvalidPduData(format!("malformed UUID: {}", s)))
    }
}

/// GUID: `{ u32, u16, u16, u8[8] }`, aligned to 4.
impl NdrEncode for Uuid {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u32(self.time_low);
        w.write_u16(self.time_mid);
        w.write_u16(self.time_hi_and_version);
        w.write_u8(self.clock_seq_hi_and_reserved);
        w.write_u8(self.clock_seq_low);
        w.write_bytes(&self.node);
        Ok(())
    }
}

impl NdrDecode for Uuid {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let time_low = r.read_u32()?;
        let time_mid = r.read_u16()?;
        let time_hi_and_version = r.read_u16()?;
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&r.read_bytes(8)?);
        Ok(Self::from_fields(time_low, time_mid, time_hi_and_version, tail))
    }
}

/// Syntax ID - interface UUID with version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxId {
    pub uuid: Uuid,
    /// Major version in the low 16 bits, minor in the high 16 bits
    pub version: u32,
}

impl SyntaxId {
    pub const fn new(uuid: Uuid, major: u16, minor: u16) -> Self {
        Self {
            uuid,
            version: (major as u32) | ((minor as u32) << 16),
        }
    }

    pub fn major_version(&self) -> u16 {
        self.version as u16
    }

    pub fn minor_version(&self) -> u16 {
        (self.version >> 16) as u16
    }
}

impl std::fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.major_version(), self.minor_version())
    }
}

impl NdrEncode for SyntaxId {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.uuid.ndr_encode(w)?;
        w.write_u32(self.version);
        Ok(())
    }
}

impl NdrDecode for SyntaxId {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            uuid: Uuid::ndr_decode(r)?,
            version: r.read_u32()?,
        })
    }
}

/// NDR transfer syntax 8a885d04-1ceb-11c9-9fe8-08002b104860
pub const NDR_SYNTAX_UUID: Uuid = Uuid::from_fields(
    0x8a88_5d04,
    0x1ceb,
    0x11c9,
    [0x9f, 0xe8, 0x08, 0x00, 0x2b, 0x10, 0x48, 0x60],
);
pub const NDR_SYNTAX_VERSION: u32 = 2;

/// NDR20 transfer syntax identifier.
pub const NDR_SYNTAX: SyntaxId = SyntaxId::new(NDR_SYNTAX_UUID, NDR_SYNTAX_VERSION as u16, 0);

/// Common PDU header (16 bytes)
#[derive(Debug, Clone)]
pub struct PduHeader {
    pub version: u8,
    pub version_minor: u8,
    pub packet_type: PacketType,
    pub packet_flags: PacketFlags,
    pub data_rep: DataRepresentation,
    /// Total length of the PDU fragment, set while encoding
    pub frag_length: u16,
    pub auth_length: u16,
    pub call_id: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    pub fn new(packet_type: PacketType, call_id: u32) -> Self {
        Self {
            version: DCE_RPC_VERSION,
            version_minor: DCE_RPC_VERSION_MINOR,
            packet_type,
            packet_flags: PacketFlags::complete(),
            data_rep: DataRepresentation::ndr(),
            frag_length: 0,
            auth_length: 0,
            call_id,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.version_minor);
        buf.put_u8(self.packet_type as u8);
        buf.put_u8(self.packet_flags.as_u8());
        buf.put_slice(&self.data_rep.encode());
        if self.data_rep.is_little_endian() {
            buf.put_u16_le(self.frag_length);
            buf.put_u16_le(self.auth_length);
            buf.put_u32_le(self.call_id);
        } else {
            buf.put_u16(self.frag_length);
            buf.put_u16(self.auth_length);
            buf.put_u32(self.call_id);
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(RpcError::short_pdu("PDU header"));
        }

        let version = data[0];
        if version != DCE_RPC_VERSION {
            return Err(RpcError::RpcVersionMismatch(version as u32));
        }

        let packet_type = PacketType::from_u8(data[2])
            .ok_or(RpcError::InvalidMessageType(data[2] as i32))?;
        let data_rep = DataRepresentation::decode([data[4], data[5], data[6], data[7]]);

        let (frag_length, auth_length, call_id) = if data_rep.is_little_endian() {
            (
                u16::from_le_bytes([data[8], data[9]]),
                u16::from_le_bytes([data[10], data[11]]),
                u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
            )
        } else {
            (
                u16::from_be_bytes([data[8], data[9]]),
                u16::from_be_bytes([data[10], data[11]]),
                u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
            )
        };

        Ok(Self {
            version,
            version_minor: data[1],
            packet_type,
            packet_flags: PacketFlags::from_u8(data[3]),
            data_rep,
            frag_length,
            auth_length,
            call_id,
        })
    }

    /// Body writer using this header's byte order.
    fn body_writer(&self) -> NdrWriter {
        NdrWriter::with_context(self.data_rep.ndr_context())
    }

    /// Prepend the header to an encoded body, filling in `frag_length`.
    ///
    /// A fragment longer than `u16::MAX` cannot be described on the wire
    /// and is refused rather than sent with a wrapped length.
    fn seal(&self, body: NdrWriter) -> Result<Bytes> {
        let body = body.into_bytes();
        let size = Self::SIZE + body.len();
        let frag_length = u16::try_from(size).map_err(|_| RpcError::RecordTooLarge {
            size,
            max: u16::MAX as usize,
        })?;
        let mut header = self.clone();
        header.frag_length = frag_length;
        header.auth_length = 0;
        let mut buf = BytesMut::with_capacity(Self::SIZE + body.len());
        header.encode(&mut buf);
        buf.put_slice(&body);
        Ok(buf.freeze())
    }

    /// Decode the header of `data` and return a reader over its body.
    ///
    /// The reader stops at `frag_length`; an authentication trailer, if a
    /// peer sent one anyway, is cut off.
    fn open(data: &Bytes, expected: PacketType) -> Result<(Self, NdrReader)> {
        let header = Self::decode(data)?;
        if header.packet_type != expected {
            return Err(RpcError::InvalidMessageType(header.packet_type as i32));
        }
        let frag_length = header.frag_length as usize;
        if frag_length < Self::SIZE || frag_length > data.len() {
            return Err(RpcError::InvalidPduData(format!(
                "fragment length {} does not match {} received bytes",
                frag_length,
                data.len()
            )));
        }
        let trailer = if header.auth_length > 0 {
            header.auth_length as usize + 8
        } else {
            0
        };
        let body_end = frag_length.saturating_sub(trailer).max(Self::SIZE);
        let reader = NdrReader::with_context(
            data.slice(Self::SIZE..body_end),
            header.data_rep.ndr_context(),
        );
        Ok((header, reader))
    }
}

/// Presentation context offered in BIND and ALTER_CONTEXT (`p_cont_elem_t`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextElement {
    pub context_id: u16,
    pub abstract_syntax: SyntaxId,
    pub transfer_syntaxes: Vec<SyntaxId>,
}

impl ContextElement {
    pub fn new(context_id: u16, abstract_syntax: SyntaxId, transfer_syntax: SyntaxId) -> Self {
        Self {
            context_id,
            abstract_syntax,
            transfer_syntaxes: vec![transfer_syntax],
        }
    }

    fn encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u16(self.context_id);
        w.write_u8(self.transfer_syntaxes.len() as u8);
        w.write_u8(0);
        self.abstract_syntax.ndr_encode(w)?;
        for ts in &self.transfer_syntaxes {
            ts.ndr_encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut NdrReader) -> Result<Self> {
        let context_id = r.read_u16()?;
        let count = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let abstract_syntax = SyntaxId::ndr_decode(r)?;
        let mut transfer_syntaxes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            transfer_syntaxes.push(SyntaxId::ndr_decode(r)?);
        }
        Ok(Self {
            context_id,
            abstract_syntax,
            transfer_syntaxes,
        })
    }
}

/// Result of a presentation context negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ContextResult {
    Acceptance = 0,
    UserRejection = 1,
    ProviderRejection = 2,
}

impl ContextResult {
    fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Acceptance,
            1 => Self::UserRejection,
            _ => Self::ProviderRejection,
        }
    }
}

/// Provider reasons for rejecting a presentation context
pub mod reject_reason {
    pub const NOT_SPECIFIED: u16 = 0;
    pub const ABSTRACT_SYNTAX_NOT_SUPPORTED: u16 = 1;
    pub const PROPOSED_TRANSFER_SYNTAXES_NOT_SUPPORTED: u16 = 2;
}

/// One entry of `p_result_list_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationResult {
    pub result: ContextResult,
    pub reason: u16,
    pub transfer_syntax: SyntaxId,
}

impl PresentationResult {
    pub fn accepted(transfer_syntax: SyntaxId) -> Self {
        Self {
            result: ContextResult::Acceptance,
            reason: reject_reason::NOT_SPECIFIED,
            transfer_syntax,
        }
    }

    pub fn rejected(reason: u16) -> Self {
        Self {
            result: ContextResult::ProviderRejection,
            reason,
            transfer_syntax: SyntaxId::new(Uuid::NIL, 0, 0),
        }
    }
}

/// Body shared by BIND and ALTER_CONTEXT.
#[derive(Debug, Clone)]
pub struct BindPdu {
    pub header: PduHeader,
    pub max_xmit_frag: u16,
    pub max_recv_frag: u16,
    pub assoc_group_id: u32,
    pub context_list: Vec<ContextElement>,
}

impl BindPdu {
    /// BIND offering `interface` as presentation context 0.
    pub fn new(call_id: u32, interface: SyntaxId) -> Self {
        Self::with_contexts(
            PacketType::Bind,
            call_id,
            vec![ContextElement::new(0, interface, NDR_SYNTAX)],
        )
    }

    pub fn with_contexts(packet_type: PacketType, call_id: u32, context_list: Vec<ContextElement>) -> Self {
        Self {
            header: PduHeader::new(packet_type, call_id),
            max_xmit_frag: DEFAULT_MAX_FRAG,
            max_recv_frag: DEFAULT_MAX_FRAG,
            assoc_group_id: 0,
            context_list,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = self.header.body_writer();
        w.write_u16(self.max_xmit_frag);
        w.write_u16(self.max_recv_frag);
        w.write_u32(self.assoc_group_id);
        w.write_u8(self.context_list.len() as u8);
        w.write_u8(0);
        w.write_u16(0);
        for ctx in &self.context_list {
            ctx.encode(&mut w)?;
        }
        self.header.seal(w)
    }

    pub fn decode(data: &Bytes, expected: PacketType) -> Result<Self> {
        let (header, mut r) = PduHeader::open(data, expected)?;
        let max_xmit_frag = r.read_u16()?;
        let max_recv_frag = r.read_u16()?;
        let assoc_group_id = r.read_u32()?;
        let count = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let _reserved2 = r.read_u16()?;
        let mut context_list = Vec::with_capacity(count as usize);
        for _ in 0..count {
            context_list.push(ContextElement::decode(&mut r)?);
        }
        Ok(Self {
            header,
            max_xmit_frag,
            max_recv_frag,
            assoc_group_id,
            context_list,
        })
    }
}

/// Body shared by BIND_ACK and ALTER_CONTEXT_RESP.
#[derive(Debug, Clone)]
pub struct BindAckPdu {
    pub header: PduHeader,
    pub max_xmit_frag: u16,
    pub max_recv_frag: u16,
    pub assoc_group_id: u32,
    /// Secondary address (the server port as a string); empty in
    /// ALTER_CONTEXT_RESP
    pub secondary_addr: String,
    pub results: Vec<PresentationResult>,
}

impl BindAckPdu {
    pub fn new(packet_type: PacketType, call_id: u32, assoc_group_id: u32, results: Vec<PresentationResult>) -> Self {
        Self {
            header: PduHeader::new(packet_type, call_id),
            max_xmit_frag: DEFAULT_MAX_FRAG,
            max_recv_frag: DEFAULT_MAX_FRAG,
            assoc_group_id,
            secondary_addr: String::new(),
            results,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = self.header.body_writer();
        w.write_u16(self.max_xmit_frag);
        w.write_u16(self.max_recv_frag);
        w.write_u32(self.assoc_group_id);
        if self.secondary_addr.is_empty() && self.header.packet_type == PacketType::AlterContextResp {
            w.write_u16(0);
        } else {
            w.write_u16(self.secondary_addr.len() as u16 + 1);
            w.write_bytes(self.secondary_addr.as_bytes());
            w.write_u8(0);
        }
        w.align(4);
        w.write_u8(self.results.len() as u8);
        w.write_u8(0);
        w.write_u16(0);
        for res in &self.results {
            w.write_u16(res.result as u16);
            w.write_u16(res.reason);
            res.transfer_syntax.ndr_encode(&mut w)?;
        }
        self.header.seal(w)
    }

    pub fn decode(data: &Bytes, expected: PacketType) -> Result<Self> {
        let (header, mut r) = PduHeader::open(data, expected)?;
        let max_xmit_frag = r.read_u16()?;
        let max_recv_frag = r.read_u16()?;
        let assoc_group_id = r.read_u32()?;
        let addr_len = r.read_u16()? as usize;
        let raw = r.read_bytes(addr_len)?;
        let secondary_addr = String::from_utf8_lossy(raw.strip_suffix(&[0u8]).unwrap_or(&raw[..])).into_owned();
        r.align(4)?;
        let count = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let _reserved2 = r.read_u16()?;
        let mut results = Vec::with_capacity(count as usize);
        for _ in 0..count {
            results.push(PresentationResult {
                result: ContextResult::from_u16(r.read_u16()?),
                reason: r.read_u16()?,
                transfer_syntax: SyntaxId::ndr_decode(&mut r)?,
            });
        }
        Ok(Self {
            header,
            max_xmit_frag,
            max_recv_frag,
            assoc_group_id,
            secondary_addr,
            results,
        })
    }
}

/// ALTER_CONTEXT shares the BIND body.
pub type AlterContextPdu = BindPdu;
/// ALTER_CONTEXT_RESP shares the BIND_ACK body.
pub type AlterContextRespPdu = BindAckPdu;

/// BIND_NAK PDU
#[derive(Debug, Clone)]
pub struct BindNakPdu {
    pub header: PduHeader,
    pub reject_reason: u16,
    /// Supported protocol versions as (major, minor)
    pub versions: Vec<(u8, u8)>,
}

impl BindNakPdu {
    pub const REASON_NOT_SPECIFIED: u16 = 0;
    pub const PROTOCOL_VERSION_NOT_SUPPORTED: u16 = 4;

    pub fn new(call_id: u32, reject_reason: u16) -> Self {
        Self {
            header: PduHeader::new(PacketType::BindNak, call_id),
            reject_reason,
            versions: vec![(DCE_RPC_VERSION, DCE_RPC_VERSION_MINOR)],
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = self.header.body_writer();
        w.write_u16(self.reject_reason);
        w.write_u8(self.versions.len() as u8);
        for (major, minor) in &self.versions {
            w.write_u8(*major);
            w.write_u8(*minor);
        }
        self.header.seal(w)
    }

    pub fn decode(data: &Bytes) -> Result<Self> {
        let (header, mut r) = PduHeader::open(data, PacketType::BindNak)?;
        let reject_reason = r.read_u16()?;
        let mut versions = Vec::new();
        if r.remaining() > 0 {
            let count = r.read_u8()?;
            for _ in 0..count {
                versions.push((r.read_u8()?, r.read_u8()?));
            }
        }
        Ok(Self {
            header,
            reject_reason,
            versions,
        })
    }
}

/// Request PDU
#[derive(Debug, Clone)]
pub struct RequestPdu {
    pub header: PduHeader,
    pub alloc_hint: u32,
    pub context_id: u16,
    pub opnum: u16,
    /// Object UUID; DCOM sends the target IPID here
    pub object_uuid: Option<Uuid>,
    pub stub_data: Bytes,
}

impl RequestPdu {
    /// alloc_hint(4) + context_id(2) + opnum(2)
    pub const BODY_HEADER_SIZE: usize = 8;

    pub fn new(call_id: u32, opnum: u16, stub_data: Bytes) -> Self {
        Self {
            header: PduHeader::new(PacketType::Request, call_id),
            alloc_hint: stub_data.len() as u32,
            context_id: 0,
            opnum,
            object_uuid: None,
            stub_data,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut header = self.header.clone();
        let mut flags = header.packet_flags.as_u8() & !PacketFlags::OBJECT_UUID;
        if self.object_uuid.is_some() {
            flags |= PacketFlags::OBJECT_UUID;
        }
        header.packet_flags = PacketFlags::from_u8(flags);

        let mut w = header.body_writer();
        w.write_u32(self.alloc_hint);
        w.write_u16(self.context_id);
        w.write_u16(self.opnum);
        if let Some(object) = &self.object_uuid {
            object.ndr_encode(&mut w)?;
        }
        w.write_bytes(&self.stub_data);
        header.seal(w)
    }

    pub fn decode(data: &Bytes) -> Result<Self> {
        let (header, mut r) = PduHeader::open(data, PacketType::Request)?;
        let alloc_hint = r.read_u32()?;
        let context_id = r.read_u16()?;
        let opnum = r.read_u16()?;
        let object_uuid = if header.packet_flags.has_object_uuid() {
            Some(Uuid::ndr_decode(&mut r)?)
        } else {
            None
        };
        let stub_data = r.read_bytes(r.remaining())?;
        Ok(Self {
            header,
            alloc_hint,
            context_id,
            opnum,
            object_uuid,
            stub_data,
        })
    }
}

/// Response PDU
#[derive(Debug, Clone)]
pub struct ResponsePdu {
    pub header: PduHeader,
    pub alloc_hint: u32,
    pub context_id: u16,
    pub cancel_count: u8,
    pub stub_data: Bytes,
}

impl ResponsePdu {
    /// alloc_hint(4) + context_id(2) + cancel_count(1) + reserved(1)
    pub const BODY_HEADER_SIZE: usize = 8;

    pub fn new(call_id: u32, stub_data: Bytes) -> Self {
        Self {
            header: PduHeader::new(PacketType::Response, call_id),
            alloc_hint: stub_data.len() as u32,
            context_id: 0,
            cancel_count: 0,
            stub_data,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = self.header.body_writer();
        w.write_u32(self.alloc_hint);
        w.write_u16(self.context_id);
        w.write_u8(self.cancel_count);
        w.write_u8(0);
        w.write_bytes(&self.stub_data);
        self.header.seal(w)
    }

    pub fn decode(data: &Bytes) -> Result<Self> {
        let (header, mut r) = PduHeader::open(data, PacketType::Response)?;
        let alloc_hint = r.read_u32()?;
        let context_id = r.read_u16()?;
        let cancel_count = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let stub_data = r.read_bytes(r.remaining())?;
        Ok(Self {
            header,
            alloc_hint,
            context_id,
            cancel_count,
            stub_data,
        })
    }
}

/// Fault status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FaultStatus {
    /// nca_s_fault_unspec
    RpcError = 0x1c00_0000,
    /// nca_s_fault_context_mismatch
    ContextMismatch = 0x1c00_001a,
    /// nca_op_rng_error
    OpRngError = 0x1c01_0002,
    /// nca_unk_if
    UnkIf = 0x1c01_0003,
    /// nca_proto_error
    ProtoError = 0x1c01_000b,
    /// RPC_X_BAD_STUB_DATA
    BadStubData = 0x0000_06f7,
    AccessDenied = 0x0000_0005,
}

/// Fault PDU
#[derive(Debug, Clone)]
pub struct FaultPdu {
    pub header: PduHeader,
    pub alloc_hint: u32,
    pub context_id: u16,
    pub cancel_count: u8,
    pub status: u32,
}

impl FaultPdu {
    pub fn new(call_id: u32, status: FaultStatus) -> Self {
        Self::with_status(call_id, status as u32)
    }

    pub fn with_status(call_id: u32, status: u32) -> Self {
        let mut header = PduHeader::new(PacketType::Fault, call_id);
        header.packet_flags = PacketFlags::from_u8(
            PacketFlags::FIRST_FRAG | PacketFlags::LAST_FRAG | PacketFlags::DID_NOT_EXECUTE,
        );
        Self {
            header,
            alloc_hint: 0,
            context_id: 0,
            cancel_count: 0,
            status,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = self.header.body_writer();
        w.write_u32(self.alloc_hint);
        w.write_u16(self.context_id);
        w.write_u8(self.cancel_count);
        w.write_u8(0);
        w.write_u32(self.status);
        w.write_u32(0);
        self.header.seal(w)
    }

    pub fn decode(data: &Bytes) -> Result<Self> {
        let (header, mut r) = PduHeader::open(data, PacketType::Fault)?;
        let alloc_hint = r.read_u32()?;
        let context_id = r.read_u16()?;
        let cancel_count = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let status = r.read_u32()?;
        Ok(Self {
            header,
            alloc_hint,
            context_id,
            cancel_count,
            status,
        })
    }
}

/// Represents any connection-oriented PDU handled by this crate
#[derive(Debug, Clone)]
pub enum Pdu {
    Bind(BindPdu),
    BindAck(BindAckPdu),
    BindNak(BindNakPdu),
    AlterContext(AlterContextPdu),
    AlterContextResp(AlterContextRespPdu),
    Request(RequestPdu),
    Response(ResponsePdu),
    Fault(FaultPdu),
    /// Header-only PDUs: shutdown, co_cancel, orphaned
    Control(PduHeader),
}

impl Pdu {
    pub fn decode(data: &Bytes) -> Result<Self> {
        let header = PduHeader::decode(data)?;
        Ok(match header.packet_type {
            PacketType::Bind => Pdu::Bind(BindPdu::decode(data, PacketType::Bind)?),
            PacketType::BindAck => Pdu::BindAck(BindAckPdu::decode(data, PacketType::BindAck)?),
            PacketType::BindNak => Pdu::BindNak(BindNakPdu::decode(data)?),
            PacketType::AlterContext => {
                Pdu::AlterContext(BindPdu::decode(data, PacketType::AlterContext)?)
            }
            PacketType::AlterContextResp => {
                Pdu::AlterContextResp(BindAckPdu::decode(data, PacketType::AlterContextResp)?)
            }
            PacketType::Request => Pdu::Request(RequestPdu::decode(data)?),
            PacketType::Response => Pdu::Response(ResponsePdu::decode(data)?),
            PacketType::Fault => Pdu::Fault(FaultPdu::decode(data)?),
            PacketType::Shutdown | PacketType::CoCancel | PacketType::Orphaned => Pdu::Control(header),
        })
    }

    pub fn encode(&self) -> Result<Bytes> {
        match self {
            Pdu::Bind(pdu) | Pdu::AlterContext(pdu) => pdu.encode(),
            Pdu::BindAck(pdu) | Pdu::AlterContextResp(pdu) => pdu.encode(),
            Pdu::BindNak(pdu) => pdu.encode(),
            Pdu::Request(pdu) => pdu.encode(),
            Pdu::Response(pdu) => pdu.encode(),
            Pdu::Fault(pdu) => pdu.encode(),
            Pdu::Control(header) => header.seal(header.body_writer()),
        }
    }

    pub fn header(&self) -> &PduHeader {
        match self {
            Pdu::Bind(pdu) | Pdu::AlterContext(pdu) => &pdu.header,
            Pdu::BindAck(pdu) | Pdu::AlterContextResp(pdu) => &pdu.header,
            Pdu::BindNak(pdu) => &pdu.header,
            Pdu::Request(pdu) => &pdu.header,
            Pdu::Response(pdu) => &pdu.header,
            Pdu::Fault(pdu) => &pdu.header,
            Pdu::Control(header) => header,
        }
    }

    pub fn call_id(&self) -> u32 {
        self.header().call_id
    }
}
