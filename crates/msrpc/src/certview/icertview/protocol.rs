//! ICertView wire structures

use crate::oaut::{Bstr, Variant};
use crate::orpc::OrpcResponse;
use dcom::types::{HResult, MInterfacePointer, OrpcThat, OrpcThis};
use dcom::ReturnCode;
use dcerpc::{Operation, SyntaxId, Uuid};
use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, UniquePtr};

/// c3fac344-1e84-11d1-9bd6-00c04fb683fa
pub const CERT_VIEW_IID: Uuid = Uuid::from_fields(
    0xc3fa_c344,
    0x1e84,
    0x11d1,
    [0x9b, 0xd6, 0x00, 0xc0, 0x4f, 0xb6, 0x83, 0xfa],
);

pub const CERT_VIEW_SYNTAX_V0_0: SyntaxId = SyntaxId::new(CERT_VIEW_IID, 0, 0);

pub mod opnum {
    pub const OPEN_CONNECTION: u16 = 7;
    pub const ENUM_CERT_VIEW_COLUMN: u16 = 8;
    pub const GET_COLUMN_COUNT: u16 = 9;
    pub const GET_COLUMN_INDEX: u16 = 10;
    pub const SET_RESULT_COLUMN_COUNT: u16 = 11;
    pub const SET_RESULT_COLUMN: u16 = 12;
    pub const SET_RESTRICTION: u16 = 13;
    pub const OPEN_VIEW: u16 = 14;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenConnectionRequest {
    pub this: OrpcThis,
    /// `host\CA name` of the certification authority
    pub config: Bstr,
}

impl NdrEncode for OpenConnectionRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_param(&self.config)
    }
}

impl NdrDecode for OpenConnectionRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            config: r.read_param()?,
        })
    }
}

pub type OpenConnectionResponse = OrpcResponse;

/// Request carrying only `fResultColumn`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnKindRequest {
    pub this: OrpcThis,
    pub result_column: i32,
}

impl NdrEncode for ColumnKindRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_i32(self.result_column);
        Ok(())
    }
}

impl NdrDecode for ColumnKindRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            result_column: r.read_i32()?,
        })
    }
}

pub type EnumCertViewColumnRequest = ColumnKindRequest;
pub type GetColumnCountRequest = ColumnKindRequest;

/// A response returning one interface pointer (an enumerator).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumeratorResponse {
    pub that: OrpcThat,
    pub enumerator: UniquePtr<MInterfacePointer>,
    pub ret: HResult,
}

impl NdrEncode for EnumeratorResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.enumerator)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for EnumeratorResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            enumerator: r.read_param()?,
            ret: r.read_param()?,
        })
    }
}

/// Returns an `IEnumCERTVIEWCOLUMN`.
pub type EnumCertViewColumnResponse = EnumeratorResponse;

/// Response carrying one `long`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueResponse {
    pub that: OrpcThat,
    pub value: i32,
    pub ret: HResult,
}

impl NdrEncode for ValueResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_i32(self.value);
        w.write_param(&self.ret)
    }
}

impl NdrDecode for ValueResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            value: r.read_i32()?,
            ret: r.read_param()?,
        })
    }
}

pub type GetColumnCountResponse = ValueResponse;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetColumnIndexRequest {
    pub this: OrpcThis,
    pub result_column: i32,
    pub column_name: Bstr,
}

impl NdrEncode for GetColumnIndexRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_i32(self.result_column);
        w.write_param(&self.column_name)
    }
}

impl NdrDecode for GetColumnIndexRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            result_column: r.read_i32()?,
            column_name: r.read_param()?,
        })
    }
}

pub type GetColumnIndexResponse = ValueResponse;

/// Request carrying a single `long` argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnRequest {
    pub this: OrpcThis,
    pub value: i32,
}

impl NdrEncode for ColumnRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_i32(self.value);
        Ok(())
    }
}

impl NdrDecode for ColumnRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            value: r.read_i32()?,
        })
    }
}

/// `cResultColumn`
pub type SetResultColumnCountRequest = ColumnRequest;
pub type SetResultColumnCountResponse = OrpcResponse;
/// `ColumnIndex`
pub type SetResultColumnRequest = ColumnRequest;
pub type SetResultColumnResponse = OrpcResponse;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SetRestrictionRequest {
    pub this: OrpcThis,
    pub column_index: i32,
    pub seek_operator: i32,
    pub sort_order: i32,
    pub value: UniquePtr<Variant>,
}

impl NdrEncode for SetRestrictionRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_i32(self.column_index);
        w.write_i32(self.seek_operator);
        w.write_i32(self.sort_order);
        w.write_param(&self.value)
    }
}

impl NdrDecode for SetRestrictionRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            column_index: r.read_i32()?,
            seek_operator: r.read_i32()?,
            sort_order: r.read_i32()?,
            value: r.read_param()?,
        })
    }
}

pub type SetRestrictionResponse = OrpcResponse;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenViewRequest {
    pub this: OrpcThis,
}

impl NdrEncode for OpenViewRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)
    }
}

impl NdrDecode for OpenViewRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self { this: r.read_param()? })
    }
}

/// Returns an `IEnumCERTVIEWROW`.
pub type OpenViewResponse = EnumeratorResponse;

impl ReturnCode for EnumeratorResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}

impl ReturnCode for ValueResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}

macro_rules! cert_view_op {
    ($op:ident, $opnum:expr, $name:literal, $req:ty, $resp:ty) => {
        pub struct $op;

        impl Operation for $op {
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = concat!("/ICertView/v0/", $name);
            type Request = $req;
            type Response = $resp;
        }
    };
}

cert_view_op!(OpenConnectionOp, opnum::OPEN_CONNECTION, "OpenConnection", OpenConnectionRequest, OpenConnectionResponse);
cert_view_op!(EnumCertViewColumnOp, opnum::ENUM_CERT_VIEW_COLUMN, "EnumCertViewColumn", EnumCertViewColumnRequest, EnumCertViewColumnResponse);
cert_view_op!(GetColumnCountOp, opnum::GET_COLUMN_COUNT, "GetColumnCount", GetColumnCountRequest, GetColumnCountResponse);
cert_view_op!(GetColumnIndexOp, opnum::GET_COLUMN_INDEX, "GetColumnIndex", GetColumnIndexRequest, GetColumnIndexResponse);
cert_view_op!(SetResultColumnCountOp, opnum::SET_RESULT_COLUMN_COUNT, "SetResultColumnCount", SetResultColumnCountRequest, SetResultColumnCountResponse);
cert_view_op!(SetResultColumnOp, opnum::SET_RESULT_COLUMN, "SetResultColumn", SetResultColumnRequest, SetResultColumnResponse);
cert_view_op!(SetRestrictionOp, opnum::SET_RESTRICTION, "SetRestriction", SetRestrictionRequest, SetRestrictionResponse);
cert_view_op!(OpenViewOp, opnum::OPEN_VIEW, "OpenView", OpenViewRequest, OpenViewResponse);
