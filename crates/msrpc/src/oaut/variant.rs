//! VARIANT as it travels over the wire (MS-OAUT 2.2.29.2)
//!
//! ```text
//! typedef struct _wireVARIANT {
//!     DWORD  clSize;
//!     DWORD  rpcReserved;
//!     USHORT vt;
//!     USHORT wReserved1, wReserved2, wReserved3;
//!     [switch_type(ULONG), switch_is(vt)] union { ... };
//! } wireVARIANTStr;
//! typedef [unique] wireVARIANTStr* VARIANT;
//! ```
//!
//! Only scalar, BSTR and interface arms are modelled. `VT_BYREF`, arrays,
//! records and decimals fail with `InvalidDiscriminant`.

use super::Bstr;
use dcom::types::{HResult, MInterfacePointer};
use midl_ndr::{
    decode_union, encode_union, ndr_enum, NdrDecode, NdrEncode, NdrError, NdrReader, NdrUnion,
    NdrWriter, UniquePtr,
};

ndr_enum! {
    /// VARENUM values with a wire representation here
    pub enum VarType {
        Empty = 0,
        Null = 1,
        I2 = 2,
        I4 = 3,
        R4 = 4,
        R8 = 5,
        Cy = 6,
        Date = 7,
        Bstr = 8,
        Dispatch = 9,
        Error = 10,
        Bool = 11,
        Unknown = 13,
        I1 = 16,
        Ui1 = 17,
        Ui2 = 18,
        Ui4 = 19,
        I8 = 20,
        Ui8 = 21,
        Int = 22,
        Uint = 23,
    }
}

/// `VARIANT_TRUE`; `VARIANT_FALSE` is zero.
pub const VARIANT_TRUE: i16 = -1;

/// The body of a wireVARIANT. Parameters use `UniquePtr<Variant>`, the
/// wire `VARIANT` type.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Variant {
    #[default]
    Empty,
    Null,
    I1(i8),
    I2(i16),
    I4(i32),
    I8(i64),
    Ui1(u8),
    Ui2(u16),
    Ui4(u32),
    Ui8(u64),
    Int(i32),
    Uint(u32),
    R4(f32),
    R8(f64),
    /// CURRENCY: fixed point, scaled by 10 000
    Cy(i64),
    /// DATE: days since 1899-12-30
    Date(f64),
    Bstr(Bstr),
    Error(HResult),
    Bool(bool),
    Unknown(UniquePtr<MInterfacePointer>),
    Dispatch(UniquePtr<MInterfacePointer>),
}

impl Variant {
    pub fn var_type(&self) -> VarType {
        match self {
            Variant::Empty => VarType::Empty,
            Variant::Null => VarType::Null,
            Variant::I1(_) => VarType::I1,
            Variant::I2(_) => VarType::I2,
            Variant::I4(_) => VarType::I4,
            Variant::I8(_) => VarType::I8,
            Variant::Ui1(_) => VarType::Ui1,
            Variant::Ui2(_) => VarType::Ui2,
            Variant::Ui4(_) => VarType::Ui4,
            Variant::Ui8(_) => VarType::Ui8,
            Variant::Int(_) => VarType::Int,
            Variant::Uint(_) => VarType::Uint,
            Variant::R4(_) => VarType::R4,
            Variant::R8(_) => VarType::R8,
            Variant::Cy(_) => VarType::Cy,
            Variant::Date(_) => VarType::Date,
            Variant::Bstr(_) => VarType::Bstr,
            Variant::Error(_) => VarType::Error,
            Variant::Bool(_) => VarType::Bool,
            Variant::Unknown(_) => VarType::Unknown,
            Variant::Dispatch(_) => VarType::Dispatch,
        }
    }

    /// Inline size of the arm in bytes.
    fn arm_size(&self) -> usize {
        match self {
            Variant::Empty | Variant::Null => 0,
            Variant::I1(_) | Variant::Ui1(_) => 1,
            Variant::I2(_) | Variant::Ui2(_) | Variant::Bool(_) => 2,
            Variant::I8(_) | Variant::Ui8(_) | Variant::R8(_) | Variant::Cy(_) | Variant::Date(_) => 8,
            _ => 4,
        }
    }

    /// `clSize`: size of the inline structure in 16-byte quanta.
    fn quanta(&self) -> u32 {
        // 16 bytes of header, the 4-byte discriminant padded to 8
        let size = 24 + self.arm_size();
        size.div_ceil(16) as u32
    }

    /// Shorthand for a BSTR variant.
    pub fn bstr(s: &str) -> Self {
        Variant::Bstr(Bstr::new(s))
    }

    /// Integer view of the numeric arms.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match self {
            Variant::I1(v) => i64::from(*v),
            Variant::I2(v) => i64::from(*v),
            Variant::I4(v) | Variant::Int(v) => i64::from(*v),
            Variant::I8(v) => *v,
            Variant::Ui1(v) => i64::from(*v),
            Variant::Ui2(v) => i64::from(*v),
            Variant::Ui4(v) | Variant::Uint(v) => i64::from(*v),
            Variant::Ui8(v) => i64::try_from(*v).ok()?,
            _ => return None,
        })
    }
}

impl NdrUnion for Variant {
    const ARM_ALIGNMENT: usize = 8;

    fn discriminant(&self) -> u32 {
        u32::from(self.var_type().as_u16())
    }

    fn encode_arm(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        match self {
            Variant::Empty | Variant::Null => Ok(()),
            Variant::I1(v) => v.ndr_encode(w),
            Variant::I2(v) => v.ndr_encode(w),
            Variant::I4(v) | Variant::Int(v) => v.ndr_encode(w),
            Variant::I8(v) | Variant::Cy(v) => v.ndr_encode(w),
            Variant::Ui1(v) => v.ndr_encode(w),
            Variant::Ui2(v) => v.ndr_encode(w),
            Variant::Ui4(v) | Variant::Uint(v) => v.ndr_encode(w),
            Variant::Ui8(v) => v.ndr_encode(w),
            Variant::R4(v) => v.ndr_encode(w),
            Variant::R8(v) | Variant::Date(v) => v.ndr_encode(w),
            Variant::Bstr(v) => v.ndr_encode(w),
            Variant::Error(v) => v.ndr_encode(w),
            Variant::Bool(v) => {
                w.write_i16(if *v { VARIANT_TRUE } else { 0 });
                Ok(())
            }
            Variant::Unknown(v) | Variant::Dispatch(v) => v.ndr_encode(w),
        }
    }

    fn encode_arm_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        match self {
            Variant::Bstr(v) => v.ndr_encode_deferred(w),
            Variant::Unknown(v) | Variant::Dispatch(v) => v.ndr_encode_deferred(w),
            _ => Ok(()),
        }
    }

    fn decode_arm(discriminant: u32, r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let vt = u16::try_from(discriminant)
            .ok()
            .and_then(VarType::from_u16)
            .ok_or(NdrError::InvalidDiscriminant(i64::from(discriminant)))?;
        Ok(match vt {
            VarType::Empty => Variant::Empty,
            VarType::Null => Variant::Null,
            VarType::I1 => Variant::I1(r.read_i8()?),
            VarType::I2 => Variant::I2(r.read_i16()?),
            VarType::I4 => Variant::I4(r.read_i32()?),
            VarType::I8 => Variant::I8(r.read_i64()?),
            VarType::Ui1 => Variant::Ui1(r.read_u8()?),
            VarType::Ui2 => Variant::Ui2(r.read_u16()?),
            VarType::Ui4 => Variant::Ui4(r.read_u32()?),
            VarType::Ui8 => Variant::Ui8(r.read_u64()?),
            VarType::Int => Variant::Int(r.read_i32()?),
            VarType::Uint => Variant::Uint(r.read_u32()?),
            VarType::R4 => Variant::R4(r.read_f32()?),
            VarType::R8 => Variant::R8(r.read_f64()?),
            VarType::Cy => Variant::Cy(r.read_i64()?),
            VarType::Date => Variant::Date(r.read_f64()?),
            VarType::Bstr => Variant::Bstr(Bstr::ndr_decode(r)?),
            VarType::Error => Variant::Error(HResult::ndr_decode(r)?),
            VarType::Bool => Variant::Bool(r.read_i16()? != 0),
            VarType::Unknown => Variant::Unknown(UniquePtr::ndr_decode(r)?),
            VarType::Dispatch => Variant::Dispatch(UniquePtr::ndr_decode(r)?),
        })
    }

    fn decode_arm_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        match self {
            Variant::Bstr(v) => v.ndr_decode_deferred(r),
            Variant::Unknown(v) | Variant::Dispatch(v) => v.ndr_decode_deferred(r),
            _ => Ok(()),
        }
    }
}

impl NdrEncode for Variant {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.align(8);
        w.write_u32(self.quanta());
        w.write_u32(0);
        w.write_u16(self.var_type().as_u16());
        w.write_u16(0);
        w.write_u16(0);
        w.write_u16(0);
        encode_union(self, w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.encode_arm_deferred(w)
    }
}

impl NdrDecode for Variant {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        r.align(8)?;
        let _quanta = r.read_u32()?;
        let _reserved = r.read_u32()?;
        let vt = r.read_u16()?;
        for _ in 0..3 {
            r.read_u16()?;
        }
        let value: Variant = decode_union(r)?;
        if value.var_type().as_u16() != vt {
            return Err(NdrError::InvalidDiscriminant(i64::from(vt)));
        }
        Ok(value)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        self.decode_arm_deferred(r)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::I4(v)
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::bstr(v)
    }
}
