//! Encoding traits and their implementations for NDR primitive types.
//!
//! | MIDL type       | Rust type | Size | Alignment |
//! |-----------------|-----------|------|-----------|
//! | boolean, byte   | bool, u8  | 1    | 1         |
//! | small           | i8        | 1    | 1         |
//! | short           | i16       | 2    | 2         |
//! | unsigned short  | u16       | 2    | 2         |
//! | long            | i32       | 4    | 4         |
//! | unsigned long   | u32       | 4    | 4         |
//! | hyper           | i64       | 8    | 8         |
//! | unsigned hyper  | u64       | 8    | 8         |
//! | float           | f32       | 4    | 4         |
//! | double          | f64       | 8    | 8         |

use crate::{NdrReader, NdrWriter, Result};

/// A type with an NDR wire representation.
///
/// Encoding happens in two passes. `ndr_encode` writes the inline part,
/// which for an embedded pointer is only its referent ID. Once the
/// enclosing top-level parameter is complete, `ndr_encode_deferred` writes
/// the data those pointers refer to, depth first.
pub trait NdrEncode {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()>;

    fn ndr_encode_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }
}

/// Decoding counterpart of [`NdrEncode`].
///
/// `ndr_decode` returns the value with every non-null pointer holding a
/// default pointee; `ndr_decode_deferred` then fills those pointees in.
pub trait NdrDecode: Sized {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self>;

    fn ndr_decode_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }
}

macro_rules! impl_ndr_primitive {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl NdrEncode for $ty {
                fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
                    w.$write(*self);
                    Ok(())
                }
            }

            impl NdrDecode for $ty {
                fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                    r.$read()
                }
            }
        )*
    };
}

impl_ndr_primitive! {
    u8 => write_u8, read_u8;
    i8 => write_i8, read_i8;
    u16 => write_u16, read_u16;
    i16 => write_i16, read_i16;
    u32 => write_u32, read_u32;
    i32 => write_i32, read_i32;
    u64 => write_u64, read_u64;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

impl NdrEncode for bool {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u8(u8::from(*self));
        Ok(())
    }
}

impl NdrDecode for bool {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(r.read_u8()? != 0)
    }
}

/// Fixed-size array: elements inline, then each element's pointees.
impl<T: NdrEncode, const N: usize> NdrEncode for [T; N] {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        self.iter().try_for_each(|item| item.ndr_encode(w))
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.iter().try_for_each(|item| item.ndr_encode_deferred(w))
    }
}

impl<T: NdrDecode + Default + Copy, const N: usize> NdrDecode for [T; N] {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = T::ndr_decode(r)?;
        }
        Ok(out)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.iter_mut().try_for_each(|item| item.ndr_decode_deferred(r))
    }
}

impl<T: NdrEncode + ?Sized> NdrEncode for &T {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).ndr_encode_deferred(w)
    }
}
