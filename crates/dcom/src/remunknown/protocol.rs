//! IRemUnknown wire structures (MS-DCOM 3.1.1.5.6)
//!
//! Every request starts with an ORPCTHIS and every response with an
//! ORPCTHAT; the method's own parameters follow in IDL order and the
//! HRESULT `Return` comes last.

use crate::call::ReturnCode;
use crate::types::{iid, HResult, Iid, Ipid, OrpcThat, OrpcThis, StdObjRef};
use dcerpc::{Operation, SyntaxId, Uuid};
use midl_ndr::{
    read_sized, write_sized, ConformantArray, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter,
    UniquePtr,
};

/// 00000131-0000-0000-c000-000000000046
pub const REMUNKNOWN_IID: Uuid = iid::IREMUNKNOWN;

pub const REMUNKNOWN_SYNTAX_V0_0: SyntaxId = SyntaxId::new(REMUNKNOWN_IID, 0, 0);

/// IRemUnknown operation numbers; 0-2 belong to IUnknown.
pub mod opnum {
    pub const REM_QUERY_INTERFACE: u16 = 3;
    pub const REM_ADD_REF: u16 = 4;
    pub const REM_RELEASE: u16 = 5;
}

fn count_u16(len: usize) -> midl_ndr::Result<u16> {
    u16::try_from(len).map_err(|_| NdrError::CountOverflow(len))
}

/// REMQIRESULT: outcome of one interface request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemQiResult {
    pub hresult: HResult,
    /// Valid only when `hresult` is a success code.
    pub std: StdObjRef,
}

impl RemQiResult {
    pub fn ok(std: StdObjRef) -> Self {
        Self {
            hresult: HResult::OK,
            std,
        }
    }

    pub fn failed(hresult: HResult) -> Self {
        Self {
            hresult,
            std: StdObjRef::default(),
        }
    }
}

impl NdrEncode for RemQiResult {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.align(8);
        self.hresult.ndr_encode(w)?;
        self.std.ndr_encode(w)
    }
}

impl NdrDecode for RemQiResult {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        r.align(8)?;
        Ok(Self {
            hresult: HResult::ndr_decode(r)?,
            std: StdObjRef::ndr_decode(r)?,
        })
    }
}

/// REMINTERFACEREF: reference count change for one IPID.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemInterfaceRef {
    pub ipid: Ipid,
    pub public_refs: u32,
    pub private_refs: u32,
}

impl RemInterfaceRef {
    pub fn new(ipid: Ipid, public_refs: u32) -> Self {
        Self {
            ipid,
            public_refs,
            private_refs: 0,
        }
    }
}

impl NdrEncode for RemInterfaceRef {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.ipid.ndr_encode(w)?;
        w.write_u32(self.public_refs);
        w.write_u32(self.private_refs);
        Ok(())
    }
}

impl NdrDecode for RemInterfaceRef {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            ipid: Ipid::ndr_decode(r)?,
            public_refs: r.read_u32()?,
            private_refs: r.read_u32()?,
        })
    }
}

/// RemQueryInterface request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemQueryInterfaceRequest {
    pub this: OrpcThis,
    /// Interface pointer the new interfaces are queried from
    pub ipid: Ipid,
    /// Public references requested on each returned interface
    pub refs: u32,
    pub iids: Vec<Iid>,
}

impl NdrEncode for RemQueryInterfaceRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_param(&self.ipid)?;
        w.write_u32(self.refs);
        w.write_u16(count_u16(self.iids.len())?);
        write_sized(w, &self.iids)
    }
}

impl NdrDecode for RemQueryInterfaceRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let this = r.read_param()?;
        let ipid = r.read_param()?;
        let refs = r.read_u32()?;
        let count = r.read_u16()? as usize;
        let iids = read_sized(r, count)?;
        Ok(Self {
            this,
            ipid,
            refs,
            iids,
        })
    }
}

/// RemQueryInterface response; `results` holds one entry per requested IID.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemQueryInterfaceResponse {
    pub that: OrpcThat,
    pub results: UniquePtr<ConformantArray<RemQiResult>>,
    pub ret: HResult,
}

impl RemQueryInterfaceResponse {
    pub fn results(&self) -> &[RemQiResult] {
        self.results.as_ref().map(|a| a.as_slice()).unwrap_or_default()
    }
}

impl NdrEncode for RemQueryInterfaceResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.results)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for RemQueryInterfaceResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            results: r.read_param()?,
            ret: r.read_param()?,
        })
    }
}

impl ReturnCode for RemQueryInterfaceResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}

/// RemAddRef request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemAddRefRequest {
    pub this: OrpcThis,
    pub refs: Vec<RemInterfaceRef>,
}

impl NdrEncode for RemAddRefRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u16(count_u16(self.refs.len())?);
        write_sized(w, &self.refs)
    }
}

impl NdrDecode for RemAddRefRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let this = r.read_param()?;
        let count = r.read_u16()? as usize;
        let refs = read_sized(r, count)?;
        Ok(Self { this, refs })
    }
}

/// RemAddRef response; one HRESULT per reference entry of the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemAddRefResponse {
    pub that: OrpcThat,
    pub results: Vec<HResult>,
    pub ret: HResult,
}

impl NdrEncode for RemAddRefResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        write_sized(w, &self.results)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for RemAddRefResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let that = r.read_param()?;
        // the count is the request's cInterfaceRefs, which the response
        // does not repeat; take the max count at face value
        let results = r.read_param::<ConformantArray<HResult>>()?.into_inner();
        let ret = r.read_param()?;
        Ok(Self { that, results, ret })
    }
}

impl ReturnCode for RemAddRefResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}

/// RemRelease request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemReleaseRequest {
    pub this: OrpcThis,
    pub refs: Vec<RemInterfaceRef>,
}

impl NdrEncode for RemReleaseRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u16(count_u16(self.refs.len())?);
        write_sized(w, &self.refs)
    }
}

impl NdrDecode for RemReleaseRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let this = r.read_param()?;
        let count = r.read_u16()? as usize;
        let refs = read_sized(r, count)?;
        Ok(Self { this, refs })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemReleaseResponse {
    pub that: OrpcThat,
    pub ret: HResult,
}

impl NdrEncode for RemReleaseResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for RemReleaseResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            ret: r.read_param()?,
        })
    }
}

impl ReturnCode for RemReleaseResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}

pub struct RemQueryInterfaceOp;

impl Operation for RemQueryInterfaceOp {
    const OPNUM: u16 = opnum::REM_QUERY_INTERFACE;
    const NAME: &'static str = "/IRemUnknown/v0/RemQueryInterface";
    type Request = RemQueryInterfaceRequest;
    type Response = RemQueryInterfaceResponse;
}

pub struct RemAddRefOp;

impl Operation for RemAddRefOp {
    const OPNUM: u16 = opnum::REM_ADD_REF;
    const NAME: &'static str = "/IRemUnknown/v0/RemAddRef";
    type Request = RemAddRefRequest;
    type Response = RemAddRefResponse;
}

pub struct RemReleaseOp;

impl Operation for RemReleaseOp {
    const OPNUM: u16 = opnum::REM_RELEASE;
    const NAME: &'static str = "/IRemUnknown/v0/RemRelease";
    type Request = RemReleaseRequest;
    type Response = RemReleaseResponse;
}
