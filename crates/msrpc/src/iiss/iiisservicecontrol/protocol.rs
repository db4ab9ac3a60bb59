//! IIisServiceControl wire structures

use crate::orpc::OrpcResponse;
use dcom::types::{hresult, HResult, OrpcThat, OrpcThis};
use dcom::ReturnCode;
use dcerpc::{Operation, SyntaxId, Uuid};
use midl_ndr::{ConformantArray, NdrDecode, NdrEncode, NdrReader, NdrWriter};

/// e8fb8620-588f-11d2-9d61-00c04f79c5fe
pub const IIS_SERVICE_CONTROL_IID: Uuid = Uuid::from_fields(
    0xe8fb_8620,
    0x588f,
    0x11d2,
    [0x9d, 0x61, 0x00, 0xc0, 0x4f, 0x79, 0xc5, 0xfe],
);

pub const IIS_SERVICE_CONTROL_SYNTAX_V0_0: SyntaxId = SyntaxId::new(IIS_SERVICE_CONTROL_IID, 0, 0);

pub mod opnum {
    pub const STOP: u16 = 7;
    pub const START: u16 = 8;
    pub const REBOOT: u16 = 9;
    pub const STATUS: u16 = 10;
    pub const KILL: u16 = 11;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StopRequest {
    pub this: OrpcThis,
    pub timeout_msecs: u32,
    /// Kill the services if they do not stop in time
    pub force: u32,
}

impl NdrEncode for StopRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u32(self.timeout_msecs);
        w.write_u32(self.force);
        Ok(())
    }
}

impl NdrDecode for StopRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            timeout_msecs: r.read_u32()?,
            force: r.read_u32()?,
        })
    }
}

pub type StopResponse = OrpcResponse;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartRequest {
    pub this: OrpcThis,
    pub timeout_msecs: u32,
}

impl NdrEncode for StartRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u32(self.timeout_msecs);
        Ok(())
    }
}

impl NdrDecode for StartRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            timeout_msecs: r.read_u32()?,
        })
    }
}

pub type StartResponse = OrpcResponse;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebootRequest {
    pub this: OrpcThis,
    pub timeout_msecs: u32,
    pub force_apps_closed: u32,
}

impl NdrEncode for RebootRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u32(self.timeout_msecs);
        w.write_u32(self.force_apps_closed);
        Ok(())
    }
}

impl NdrDecode for RebootRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            timeout_msecs: r.read_u32()?,
            force_apps_closed: r.read_u32()?,
        })
    }
}

pub type RebootResponse = OrpcResponse;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusRequest {
    pub this: OrpcThis,
    /// Size of the buffer the caller accepts; the response buffer has
    /// exactly this many bytes.
    pub buffer_size: u32,
}

impl NdrEncode for StatusRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)?;
        w.write_u32(self.buffer_size);
        Ok(())
    }
}

impl NdrDecode for StatusRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            this: r.read_param()?,
            buffer_size: r.read_u32()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub that: OrpcThat,
    /// Service status records (MS-IISS 2.2.2)
    pub buffer: Vec<u8>,
    /// Bytes needed to hold every record
    pub required_buffer_size: u32,
    pub num_services: u32,
    pub ret: HResult,
}

impl StatusResponse {
    /// Shape the response for a caller whose buffer holds `size` bytes.
    ///
    /// Records that fit are zero padded to `size`. Records that do not fit
    /// are not sent at all: the buffer comes back zeroed, the return code
    /// becomes `HRESULT_FROM_WIN32(ERROR_INSUFFICIENT_BUFFER)` and
    /// `required_buffer_size` says how much to ask for next time.
    /// Returns false in the second case.
    pub fn fit_to_request(&mut self, size: usize) -> bool {
        let required = self.buffer.len().max(self.required_buffer_size as usize);
        self.required_buffer_size = u32::try_from(required).unwrap_or(u32::MAX);
        if required > size {
            self.buffer = vec![0; size];
            self.ret = HResult::from_status(hresult::HRESULT_ERROR_INSUFFICIENT_BUFFER);
            return false;
        }
        self.buffer.resize(size, 0);
        true
    }
}

impl NdrEncode for StatusResponse {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_size(self.buffer.len())?;
        w.write_bytes(&self.buffer);
        w.write_u32(self.required_buffer_size);
        w.write_u32(self.num_services);
        w.write_param(&self.ret)
    }
}

impl NdrDecode for StatusResponse {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let that = r.read_param()?;
        let buffer = r.read_param::<ConformantArray<u8>>()?.into_inner();
        Ok(Self {
            that,
            buffer,
            required_buffer_size: r.read_u32()?,
            num_services: r.read_u32()?,
            ret: r.read_param()?,
        })
    }
}

impl ReturnCode for StatusResponse {
    fn return_code(&self) -> u32 {
        self.ret.code()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KillRequest {
    pub this: OrpcThis,
}

impl NdrEncode for KillRequest {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_param(&self.this)
    }
}

impl NdrDecode for KillRequest {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self { this: r.read_param()? })
    }
}

pub type KillResponse = OrpcResponse;

macro_rules! service_control_op {
    ($op:ident, $opnum:expr, $name:literal, $req:ty, $resp:ty) => {
        pub struct $op;

        impl Operation for $op {
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = concat!("/IIisServiceControl/v0/", $name);
            type Request = $req;
            type Response = $resp;
        }
    };
}

service_control_op!(StopOp, opnum::STOP, "Stop", StopRequest, StopResponse);
service_control_op!(StartOp, opnum::START, "Start", StartRequest, StartResponse);
service_control_op!(RebootOp, opnum::REBOOT, "Reboot", RebootRequest, RebootResponse);
service_control_op!(StatusOp, opnum::STATUS, "Status", StatusRequest, StatusResponse);
service_control_op!(KillOp, opnum::KILL, "Kill", KillRequest, KillResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use dcerpc::{marshal, unmarshal};

    #[test]
    fn test_stop_request_layout() {
        let req = StopRequest {
            this: OrpcThis::new(),
            timeout_msecs: 30_000,
            force: 1,
        };
        let stub = marshal(&req).unwrap();
        assert_eq!(stub.len(), 40);
        assert_eq!(&stub[32..], &[0x30, 0x75, 0, 0, 1, 0, 0, 0]);
        assert_eq!(unmarshal::<StopRequest>(stub).unwrap(), req);
    }

    #[test]
    fn test_status_response_layout() {
        let resp = StatusResponse {
            that: OrpcThat::new(),
            buffer: vec![0xaa; 5],
            required_buffer_size: 5,
            num_services: 1,
            ret: HResult::OK,
        };
        let stub = marshal(&resp).unwrap();
        // ORPCTHAT, max count, 5 bytes padded to 4, three u32
        assert_eq!(&stub[8..12], &[5, 0, 0, 0]);
        assert_eq!(&stub[17..20], &[0, 0, 0]);
        assert_eq!(stub.len(), 32);
        assert_eq!(unmarshal::<StatusResponse>(stub).unwrap(), resp);
    }

    #[test]
    fn test_fit_to_request() {
        let mut resp = StatusResponse {
            buffer: vec![1, 2, 3, 4],
            ..Default::default()
        };
        assert!(resp.fit_to_request(6));
        assert_eq!(resp.buffer, vec![1, 2, 3, 4, 0, 0]);
        assert_eq!(resp.required_buffer_size, 4);
        assert!(resp.ret.is_success());
    }

    #[test]
    fn test_fit_to_request_too_small() {
        let mut resp = StatusResponse {
            buffer: vec![1, 2, 3, 4],
            ..Default::default()
        };
        assert!(!resp.fit_to_request(2));
        assert_eq!(resp.buffer, vec![0, 0]);
        assert_eq!(resp.required_buffer_size, 4);
        assert_eq!(resp.ret.code(), hresult::HRESULT_ERROR_INSUFFICIENT_BUFFER);
    }

    #[test]
    fn test_status_buffer_beyond_stub() {
        let mut w = NdrWriter::new();
        w.write_param(&OrpcThat::new()).unwrap();
        w.write_u32(4096);
        w.write_bytes(&[0; 16]);
        assert!(unmarshal::<StatusResponse>(w.into_bytes()).is_err());
    }
}
