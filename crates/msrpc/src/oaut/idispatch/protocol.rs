//! IDispatch wire structures (MS-OAUT 3.1.4)

use crate::oaut::{DispParams, ExcepInfo, Variant};
use dcom::types::{iid, HResult, Iid, MInterfacePointer, OrpcThat, OrpcThis};
use dcom::ReturnCode;
use dcerpc::{Operation, SyntaxId, Uuid};
use midl_ndr::{
    read_sized, write_sized, ConformantArray, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWString,
    NdrWriter, UniquePtr,
};

/// 00020400-0000-0000-c000-000000000046
pub const DISPATCH_IID: Uuid = iid::IDISPATCH;

pub const DISPATCH_SYNTAX_V0_0: SyntaxId = SyntaxId::new(DISPATCH_IID, 0, 0);

/// First opnum after IDispatch's own methods.
pub const DISPATCH_OPNUM_COUNT: u16 = 7;

pub mod opnum {
    pub const GET_TYPE_INFO_COUNT: u16 = 3;
    pub const GET_TYPE_INFO: u16 = 4;
    pub const GET_IDS_OF_NAMES: u16 = 5;
    pub const INVOKE: u16 = 6;
}

/// Most names GetIDsOfNames accepts in one call.
pub const MAX_NAMES: usize = 16384;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetTypeInfoCountRequest {
    pub this: OrpcThis,
}

impl NdrEncode for GetTypeInfoCountRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)
    }
}

impl NdrDecode for GetTypeInfoCountRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self { this: r.read_param()? })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetTypeInfoCountResponse {
    pub that: OrpcThat,
    /// 1 when type information is available, else 0
    pub type_info_count: u32,
    pub ret: HResult,
}

impl NdrEncode for GetTypeInfoCountResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_u32(self.type_info_count);
        w.write_param(&self.ret)
    }
}

impl NdrDecode for GetTypeInfoCountResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            type_info_count: r.read_u32()?,
            ret: r.read_param()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetTypeInfoRequest {
    pub this: OrpcThis,
    pub type_info: u32,
    pub locale_id: u32,
}

impl NdrEncode for GetTypeInfoRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u32(self.type_info);
        w.write_u32(self.locale_id);
        Ok(())
    }
}

impl NdrDecode for GetTypeInfoRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            type_info: r.read_u32()?,
            locale_id: r.read_u32()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetTypeInfoResponse {
    pub that: OrpcThat,
    /// ITypeInfo interface pointer
    pub type_info: UniquePtr<MInterfacePointer>,
    pub ret: HResult,
}

impl NdrEncode for GetTypeInfoResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.type_info)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for GetTypeInfoResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            type_info: r.read_param()?,
            ret: r.read_param()?,
        })
    }
}

/// GetIDsOfNames request. Empty names travel as null pointers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetIdsOfNamesRequest {
    pub this: OrpcThis,
    /// Reserved, IID_NULL
    pub iid: Iid,
    pub names: Vec<String>,
    pub locale_id: u32,
}

impl NdrEncode for GetIdsOfNamesRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        if self.names.len() > MAX_NAMES {
            return Err(NdrError::CountOverflow(self.names.len()));
        }
        w.write_param(&self.this)?;
        w.write_param(&self.iid)?;
        let names: Vec<UniquePtr<NdrWString>> = self
            .names
            .iter()
            .map(|name| match name.is_empty() {
                true => UniquePtr::null(),
                false => UniquePtr::new(NdrWString::from(name.as_str())),
            })
            .collect();
        write_sized(w, &names)?;
        w.write_u32(names.len() as u32);
        w.write_u32(self.locale_id);
        Ok(())
    }
}

impl NdrDecode for GetIdsOfNamesRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let this = r.read_param()?;
        let iid = r.read_param()?;
        // cNames follows the array it sizes
        let names = r.read_param::<ConformantArray<UniquePtr<NdrWString>>>()?.into_inner();
        let count = r.read_u32()? as usize;
        if count != names.len() || count > MAX_NAMES {
            return Err(NdrError::ArraySizeMismatch {
                expected: count,
                got: names.len(),
            });
        }
        let names = names
            .into_iter()
            .map(|name| name.into_option().map(NdrWString::into_string).unwrap_or_default())
            .collect();
        Ok(Self {
            this,
            iid,
            names,
            locale_id: r.read_u32()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetIdsOfNamesResponse {
    pub that: OrpcThat,
    /// One DISPID per requested name, DISPID_UNKNOWN (-1) for misses
    pub disp_ids: Vec<i32>,
    pub ret: HResult,
}

impl NdrEncode for GetIdsOfNamesResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        write_sized(w, &self.disp_ids)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for GetIdsOfNamesResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            disp_ids: r.read_param::<ConformantArray<i32>>()?.into_inner(),
            ret: r.read_param()?,
        })
    }
}

/// Invoke request.
///
/// `var_ref_idx` and `var_ref` both have `cVarRef` elements: the indices
/// into `disp_params.args` of by-reference arguments and their values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvokeRequest {
    pub this: OrpcThis,
    pub disp_id_member: i32,
    /// Reserved, IID_NULL
    pub iid: Iid,
    pub locale_id: u32,
    pub flags: u32,
    pub disp_params: DispParams,
    pub var_ref_idx: Vec<u32>,
    pub var_ref: Vec<UniquePtr<Variant>>,
}

impl NdrEncode for InvokeRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        if self.var_ref_idx.len() != self.var_ref.len() {
            return Err(NdrError::ArraySizeMismatch {
                expected: self.var_ref_idx.len(),
                got: self.var_ref.len(),
            });
        }
        w.write_param(&self.this)?;
        w.write_i32(self.disp_id_member);
        w.write_param(&self.iid)?;
        w.write_u32(self.locale_id);
        w.write_u32(self.flags);
        w.write_param(&self.disp_params)?;
        let count = u32::try_from(self.var_ref.len()).map_err(|_| NdrError::CountOverflow(self.var_ref.len()))?;
        w.write_u32(count);
        write_sized(w, &self.var_ref_idx)?;
        write_sized(w, &self.var_ref)
    }
}

impl NdrDecode for InvokeRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let this = r.read_param()?;
        let disp_id_member = r.read_i32()?;
        let iid = r.read_param()?;
        let locale_id = r.read_u32()?;
        let flags = r.read_u32()?;
        let disp_params = r.read_param()?;
        let count = r.read_u32()? as usize;
        let var_ref_idx = read_sized(r, count)?;
        let var_ref = read_sized(r, count)?;
        Ok(Self {
            this,
            disp_id_member,
            iid,
            locale_id,
            flags,
            disp_params,
            var_ref_idx,
            var_ref,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvokeResponse {
    pub that: OrpcThat,
    pub var_result: UniquePtr<Variant>,
    pub excep_info: ExcepInfo,
    /// Index of the first argument with an error
    pub arg_err: u32,
    pub var_ref: Vec<UniquePtr<Variant>>,
    pub ret: HResult,
}

impl NdrEncode for InvokeResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.var_result)?;
        w.write_param(&self.excep_info)?;
        w.write_u32(self.arg_err);
        write_sized(w, &self.var_ref)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for InvokeResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            var_result: r.read_param()?,
            excep_info: r.read_param()?,
            arg_err: r.read_u32()?,
            var_ref: r.read_param::<ConformantArray<UniquePtr<Variant>>>()?.into_inner(),
            ret: r.read_param()?,
        })
    }
}

macro_rules! orpc_return {
    ($($resp:ty),* $(,)?) => {
        $(
            impl ReturnCode for $resp {
                fn return_code(&self) -> u32 {
                    self.ret.code()
                }
            }
        )*
    };
}

orpc_return!(
    GetTypeInfoCountResponse,
    GetTypeInfoResponse,
    GetIdsOfNamesResponse,
    InvokeResponse,
);

macro_rules! dispatch_op {
    ($op:ident, $opnum:expr, $name:literal, $req:ty, $resp:ty) => {
        pub struct $op;

        impl Operation for $op {
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = concat!("/IDispatch/v0/", $name);
            type Request = $req;
            type Response = $resp;
        }
    };
}

dispatch_op!(GetTypeInfoCountOp, opnum::GET_TYPE_INFO_COUNT, "GetTypeInfoCount", GetTypeInfoCountRequest, GetTypeInfoCountResponse);
dispatch_op!(GetTypeInfoOp, opnum::GET_TYPE_INFO, "GetTypeInfo", GetTypeInfoRequest, GetTypeInfoResponse);
dispatch_op!(GetIdsOfNamesOp, opnum::GET_IDS_OF_NAMES, "GetIDsOfNames", GetIdsOfNamesRequest, GetIdsOfNamesResponse);
dispatch_op!(InvokeOp, opnum::INVOKE, "Invoke", InvokeRequest, InvokeResponse);
