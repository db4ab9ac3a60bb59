//! Response shared by ORPC methods without out parameters

use dcom::types::{HResult, OrpcThat};
use dcom::ReturnCode;
use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};

/// `ORPCTHAT` followed by the HRESULT.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcResponse {
    pub that: OrpcThat,
    pub ret: HResult,
}

impl OrpcResponse {
    pub fn new(ret: HResult) -> Self {
        Self {
            that: OrpcThat::new(),
            ret,
        }
    }

    pub fn ok() -> Self {
        Self::new(HResult::OK)
    }
}

impl NdrEncode for OrpcResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.ret)
    }
}

impl NdrDecode for OrpcResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            that: r.read_param()?,
            ret: r.read_param()?,
        })
    }
}

impl ReturnCode for OrpcResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}
