//! IObjectExporter wire structures (MS-DCOM 3.1.2.5.1)
//!
//! IObjectExporter is a plain RPC interface: no ORPCTHIS/ORPCTHAT and an
//! `error_status_t` return instead of an HRESULT.

use crate::call::ReturnCode;
use crate::types::{iid, ComVersion, DualStringArray, Ipid, Oid, Oxid, SetId};
use dcerpc::{Operation, SyntaxId, Uuid};
use midl_ndr::{read_sized, write_sized, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, UniquePtr};

/// 99fcfec4-5260-101b-bbcb-00aa0021347a
pub const OBJECT_EXPORTER_UUID: Uuid = iid::IOBJECTEXPORTER;

pub const OBJECT_EXPORTER_SYNTAX_V0_0: SyntaxId = SyntaxId::new(OBJECT_EXPORTER_UUID, 0, 0);

/// Well-known endpoint of the resolver
pub const OXID_RESOLVER_PORT: u16 = 135;

pub mod opnum {
    pub const RESOLVE_OXID: u16 = 0;
    pub const SIMPLE_PING: u16 = 1;
    pub const COMPLEX_PING: u16 = 2;
    pub const SERVER_ALIVE: u16 = 3;
    pub const RESOLVE_OXID2: u16 = 4;
    pub const SERVER_ALIVE2: u16 = 5;
}

fn count_u16(len: usize) -> midl_ndr::Result<u16> {
    u16::try_from(len).map_err(|_| NdrError::CountOverflow(len))
}

fn write_oids(w: &mut NdrWriter, oids: &Option<Vec<Oid>>) -> midl_ndr::Result<()> {
    if w.write_referent(oids.is_some()) != 0 {
        if let Some(oids) = oids {
            write_sized(w, oids)?;
        }
    }
    Ok(())
}

fn read_oids(r: &mut NdrReader, count: usize) -> midl_ndr::Result<Option<Vec<Oid>>> {
    if r.read_referent()? == 0 {
        if count != 0 {
            return Err(NdrError::ArraySizeMismatch { expected: count, got: 0 });
        }
        return Ok(None);
    }
    read_sized(r, count).map(Some)
}

/// ResolveOxid and ResolveOxid2 request: the protocol sequences the
/// caller can use, in order of preference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveOxidRequest {
    pub oxid: Oxid,
    pub requested_protseqs: Vec<u16>,
}

impl ResolveOxidRequest {
    pub fn new(oxid: Oxid, requested_protseqs: Vec<u16>) -> Self {
        Self {
            oxid,
            requested_protseqs,
        }
    }
}

impl NdrEncode for ResolveOxidRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.oxid)?;
        w.write_u16(count_u16(self.requested_protseqs.len())?);
        write_sized(w, &self.requested_protseqs)
    }
}

impl NdrDecode for ResolveOxidRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let oxid = r.read_param()?;
        let count = r.read_u16()? as usize;
        let requested_protseqs = read_sized(r, count)?;
        Ok(Self {
            oxid,
            requested_protseqs,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveOxidResponse {
    pub oxid_bindings: UniquePtr<DualStringArray>,
    /// IPID of the exporter's IRemUnknown
    pub rem_unknown: Ipid,
    pub authn_hint: u32,
    pub ret: u32,
}

impl NdrEncode for ResolveOxidResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.oxid_bindings)?;
        w.write_param(&self.rem_unknown)?;
        w.write_u32(self.authn_hint);
        w.write_u32(self.ret);
        Ok(())
    }
}

impl NdrDecode for ResolveOxidResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            oxid_bindings: r.read_param()?,
            rem_unknown: r.read_param()?,
            authn_hint: r.read_u32()?,
            ret: r.read_u32()?,
        })
    }
}

impl ReturnCode for ResolveOxidResponse {
    fn return_code(&self) -> u32 {
        self.ret
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimplePingRequest {
    pub set_id: SetId,
}

impl NdrEncode for SimplePingRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.set_id)
    }
}

impl NdrDecode for SimplePingRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self { set_id: r.read_param()? })
    }
}

/// Response carrying only the status; shared by SimplePing and ServerAlive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub ret: u32,
}

impl NdrEncode for StatusResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u32(self.ret);
        Ok(())
    }
}

impl NdrDecode for StatusResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self { ret: r.read_u32()? })
    }
}

impl ReturnCode for StatusResponse {
    fn return_code(&self) -> u32 {
        self.ret
    }
}

/// ComplexPing request.
///
/// A zero `set_id` asks the resolver to allocate a ping set. Either OID
/// list may be absent; its count is then zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplexPingRequest {
    pub set_id: SetId,
    pub sequence_num: u16,
    pub add_to_set: Option<Vec<Oid>>,
    pub del_from_set: Option<Vec<Oid>>,
}

impl NdrEncode for ComplexPingRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.set_id)?;
        w.write_u16(self.sequence_num);
        w.write_u16(count_u16(self.add_to_set.as_ref().map_or(0, Vec::len))?);
        w.write_u16(count_u16(self.del_from_set.as_ref().map_or(0, Vec::len))?);
        write_oids(w, &self.add_to_set)?;
        write_oids(w, &self.del_from_set)
    }
}

impl NdrDecode for ComplexPingRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let set_id = r.read_param()?;
        let sequence_num = r.read_u16()?;
        let add_count = r.read_u16()? as usize;
        let del_count = r.read_u16()? as usize;
        let add_to_set = read_oids(r, add_count)?;
        let del_from_set = read_oids(r, del_count)?;
        Ok(Self {
            set_id,
            sequence_num,
            add_to_set,
            del_from_set,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplexPingResponse {
    pub set_id: SetId,
    pub ping_backoff_factor: u16,
    pub ret: u32,
}

impl NdrEncode for ComplexPingResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.set_id)?;
        w.write_u16(self.ping_backoff_factor);
        w.write_u32(self.ret);
        Ok(())
    }
}

impl NdrDecode for ComplexPingResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            set_id: r.read_param()?,
            ping_backoff_factor: r.read_u16()?,
            ret: r.read_u32()?,
        })
    }
}

impl ReturnCode for ComplexPingResponse {
    fn return_code(&self) -> u32 {
        self.ret
    }
}

/// Request of the parameterless ServerAlive and ServerAlive2.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmptyRequest;

impl NdrEncode for EmptyRequest {
    fn ndr_encode(&self, _w: &mut NdrWriter) -> midl_ndr::Result<()> {
        Ok(())
    }
}

impl NdrDecode for EmptyRequest {
    fn ndr_decode(_r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveOxid2Response {
    pub oxid_bindings: UniquePtr<DualStringArray>,
    pub rem_unknown: Ipid,
    pub authn_hint: u32,
    pub com_version: ComVersion,
    pub ret: u32,
}

impl NdrEncode for ResolveOxid2Response {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.oxid_bindings)?;
        w.write_param(&self.rem_unknown)?;
        w.write_u32(self.authn_hint);
        w.write_param(&self.com_version)?;
        w.write_u32(self.ret);
        Ok(())
    }
}

impl NdrDecode for ResolveOxid2Response {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            oxid_bindings: r.read_param()?,
            rem_unknown: r.read_param()?,
            authn_hint: r.read_u32()?,
            com_version: r.read_param()?,
            ret: r.read_u32()?,
        })
    }
}

impl ReturnCode for ResolveOxid2Response {
    fn return_code(&self) -> u32 {
        self.ret
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerAlive2Response {
    pub com_version: ComVersion,
    pub bindings: UniquePtr<DualStringArray>,
    pub reserved: u32,
    pub ret: u32,
}

impl NdrEncode for ServerAlive2Response {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.com_version)?;
        w.write_param(&self.bindings)?;
        w.write_u32(self.reserved);
        w.write_u32(self.ret);
        Ok(())
    }
}

impl NdrDecode for ServerAlive2Response {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            com_version: r.read_param()?,
            bindings: r.read_param()?,
            reserved: r.read_u32()?,
            ret: r.read_u32()?,
        })
    }
}

impl ReturnCode for ServerAlive2Response {
    fn return_code(&self) -> u32 {
        self.ret
    }
}

macro_rules! exporter_op {
    ($op:ident, $opnum:expr, $name:literal, $req:ty, $resp:ty) => {
        pub struct $op;

        impl Operation for $op {
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = concat!("/IObjectExporter/v0/", $name);
            type Request = $req;
            type Response = $resp;
        }
    };
}

exporter_op!(ResolveOxidOp, opnum::RESOLVE_OXID, "ResolveOxid", ResolveOxidRequest, ResolveOxidResponse);
exporter_op!(SimplePingOp, opnum::SIMPLE_PING, "SimplePing", SimplePingRequest, StatusResponse);
exporter_op!(ComplexPingOp, opnum::COMPLEX_PING, "ComplexPing", ComplexPingRequest, ComplexPingResponse);
exporter_op!(ServerAliveOp, opnum::SERVER_ALIVE, "ServerAlive", EmptyRequest, StatusResponse);
exporter_op!(ResolveOxid2Op, opnum::RESOLVE_OXID2, "ResolveOxid2", ResolveOxidRequest, ResolveOxid2Response);
exporter_op!(ServerAlive2Op, opnum::SERVER_ALIVE2, "ServerAlive2", EmptyRequest, ServerAlive2Response);
