//! HRESULT values (MS-ERREF 2.1)
//!
//! ```text
//!  31  30..28  27..16    15..0
//!  S   R C N   facility  code
//! ```

use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};
use std::fmt;

/// Operation successful
pub const S_OK: u32 = 0x0000_0000;
/// Operation successful, returning false
pub const S_FALSE: u32 = 0x0000_0001;
/// Not implemented
pub const E_NOTIMPL: u32 = 0x8000_4001;
/// No such interface supported
pub const E_NOINTERFACE: u32 = 0x8000_4002;
/// Invalid pointer
pub const E_POINTER: u32 = 0x8000_4003;
/// Unspecified error
pub const E_FAIL: u32 = 0x8000_4005;
/// Unexpected failure
pub const E_UNEXPECTED: u32 = 0x8000_FFFF;
/// Access denied
pub const E_ACCESSDENIED: u32 = 0x8007_0005;
/// Out of memory
pub const E_OUTOFMEMORY: u32 = 0x8007_000E;
/// Invalid argument
pub const E_INVALIDARG: u32 = 0x8007_0057;
/// Class not registered
pub const REGDB_E_CLASSNOTREG: u32 = 0x8004_0154;
/// Object or server not available
pub const CO_E_OBJNOTCONNECTED: u32 = 0x8004_01FD;
/// RPC server died
pub const RPC_E_SERVER_DIED: u32 = 0x8001_0007;
/// Unknown name passed to IDispatch::GetIDsOfNames
pub const DISP_E_UNKNOWNNAME: u32 = 0x8002_0006;
/// Unknown member passed to IDispatch::Invoke
pub const DISP_E_MEMBERNOTFOUND: u32 = 0x8002_0003;
/// Exception raised by IDispatch::Invoke, details in EXCEPINFO
pub const DISP_E_EXCEPTION: u32 = 0x8002_0009;
/// Buffer passed to a status call was too small
pub const HRESULT_ERROR_INSUFFICIENT_BUFFER: u32 = 0x8007_007A;

/// Win32 facility
pub const FACILITY_WIN32: u16 = 7;

const NAMES: &[(u32, &str)] = &[
    (S_OK, "S_OK"),
    (S_FALSE, "S_FALSE"),
    (E_NOTIMPL, "E_NOTIMPL"),
    (E_NOINTERFACE, "E_NOINTERFACE"),
    (E_POINTER, "E_POINTER"),
    (E_FAIL, "E_FAIL"),
    (E_UNEXPECTED, "E_UNEXPECTED"),
    (E_ACCESSDENIED, "E_ACCESSDENIED"),
    (E_OUTOFMEMORY, "E_OUTOFMEMORY"),
    (E_INVALIDARG, "E_INVALIDARG"),
    (REGDB_E_CLASSNOTREG, "REGDB_E_CLASSNOTREG"),
    (CO_E_OBJNOTCONNECTED, "CO_E_OBJNOTCONNECTED"),
    (RPC_E_SERVER_DIED, "RPC_E_SERVER_DIED"),
    (DISP_E_UNKNOWNNAME, "DISP_E_UNKNOWNNAME"),
    (DISP_E_MEMBERNOTFOUND, "DISP_E_MEMBERNOTFOUND"),
    (DISP_E_EXCEPTION, "DISP_E_EXCEPTION"),
    (HRESULT_ERROR_INSUFFICIENT_BUFFER, "ERROR_INSUFFICIENT_BUFFER"),
];

/// A 32-bit COM status code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HResult(pub u32);

impl HResult {
    pub const OK: Self = Self(S_OK);

    /// Wrap a raw status as returned in a `Return` field or a FAULT PDU.
    pub fn from_status(code: u32) -> Self {
        Self(code)
    }

    /// `HRESULT_FROM_WIN32`
    pub fn from_win32(code: u32) -> Self {
        if code == 0 || code & 0x8000_0000 != 0 {
            Self(code)
        } else {
            Self((code & 0xFFFF) | (u32::from(FACILITY_WIN32) << 16) | 0x8000_0000)
        }
    }

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn is_error(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    pub fn is_success(self) -> bool {
        !self.is_error()
    }

    pub fn facility(self) -> u16 {
        ((self.0 >> 16) & 0x1FFF) as u16
    }

    /// The Win32 error code behind this value, if there is one.
    ///
    /// Failures in the Win32 facility carry it in the low word; small
    /// positive values are taken to be bare Win32 codes already.
    pub fn win32(self) -> Option<u32> {
        if self.is_error() && self.facility() == FACILITY_WIN32 {
            Some(self.0 & 0xFFFF)
        } else if self.0 != 0 && self.0 <= 0xFFFF {
            Some(self.0)
        } else {
            None
        }
    }

    pub fn name(self) -> Option<&'static str> {
        NAMES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }
}

impl From<u32> for HResult {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<i32> for HResult {
    fn from(code: i32) -> Self {
        Self(code as u32)
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08x})", name, self.0),
            None => write!(f, "HRESULT 0x{:08x}", self.0),
        }
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HResult({})", self)
    }
}

impl NdrEncode for HResult {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u32(self.0);
        Ok(())
    }
}

impl NdrDecode for HResult {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self(r.read_u32()?))
    }
}
