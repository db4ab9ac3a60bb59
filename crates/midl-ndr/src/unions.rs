//! Enum and union encoding
//!
//! NDR sends `enum` values as 16-bit integers. A non-encapsulated union is
//! sent as its discriminant followed by the selected arm, and the arm starts
//! at the union's own alignment (the largest alignment of any arm), even
//! when the selected arm needs less.

use crate::{NdrReader, NdrWriter, Result};

/// Declare a 16-bit NDR enum together with its wire encoding.
///
/// The first variant is the `Default`. Unknown wire values fail with
/// [`NdrError::InvalidEnumValue`](crate::NdrError::InvalidEnumValue).
#[macro_export]
macro_rules! ndr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(#[$fmeta:meta])* $first:ident = $fvalue:expr
            $(, $(#[$vmeta:meta])* $variant:ident = $value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            $(#[$fmeta])* $first = $fvalue,
            $($(#[$vmeta])* $variant = $value,)*
        }

        impl $name {
            pub fn from_u16(value: u16) -> Option<Self> {
                const FIRST: u16 = $fvalue;
                match value {
                    FIRST => Some(Self::$first),
                    $(v if v == ($value) => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn as_u16(self) -> u16 {
                self as u16
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$first
            }
        }

        impl $crate::NdrEncode for $name {
            fn ndr_encode(&self, w: &mut $crate::NdrWriter) -> $crate::Result<()> {
                w.write_enum(self.as_u16());
                Ok(())
            }
        }

        impl $crate::NdrDecode for $name {
            fn ndr_decode(r: &mut $crate::NdrReader) -> $crate::Result<Self> {
                let value = r.read_enum()?;
                Self::from_u16(value).ok_or($crate::NdrError::InvalidEnumValue(i64::from(value)))
            }
        }
    };
}

/// A non-encapsulated union switched on a 32-bit discriminant.
pub trait NdrUnion: Sized {
    /// Alignment of the widest arm.
    const ARM_ALIGNMENT: usize;

    fn discriminant(&self) -> u32;

    fn encode_arm(&self, w: &mut NdrWriter) -> Result<()>;

    fn encode_arm_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    /// Decode the arm selected by `discriminant`, failing with
    /// [`NdrError::InvalidDiscriminant`](crate::NdrError::InvalidDiscriminant)
    /// for values the union does not define.
    fn decode_arm(discriminant: u32, r: &mut NdrReader) -> Result<Self>;

    fn decode_arm_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }
}

/// Write the discriminant, align to the union and write the arm.
pub fn encode_union<U: NdrUnion>(value: &U, w: &mut NdrWriter) -> Result<()> {
    w.write_u32(value.discriminant());
    w.align(U::ARM_ALIGNMENT);
    value.encode_arm(w)
}

pub fn decode_union<U: NdrUnion>(r: &mut NdrReader) -> Result<U> {
    let discriminant = r.read_u32()?;
    r.align(U::ARM_ALIGNMENT)?;
    U::decode_arm(discriminant, r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NdrDecode, NdrEncode, NdrError};

    ndr_enum! {
        enum Color {
            Red = 1,
            Green = 2,
            Blue = 0x10,
        }
    }

    #[derive(Debug, PartialEq)]
    enum Number {
        Small(u8),
        Big(u64),
    }

    impl NdrUnion for Number {
        const ARM_ALIGNMENT: usize = 8;

        fn discriminant(&self) -> u32 {
            match self {
                Number::Small(_) => 1,
                Number::Big(_) => 2,
            }
        }

        fn encode_arm(&self, w: &mut NdrWriter) -> Result<()> {
            match self {
                Number::Small(v) => v.ndr_encode(w),
                Number::Big(v) => v.ndr_encode(w),
            }
        }

        fn decode_arm(discriminant: u32, r: &mut NdrReader) -> Result<Self> {
            match discriminant {
                1 => Ok(Number::Small(u8::ndr_decode(r)?)),
                2 => Ok(Number::Big(u64::ndr_decode(r)?)),
                other => Err(NdrError::InvalidDiscriminant(i64::from(other))),
            }
        }
    }

    #[test]
    fn test_enum_is_16_bit() {
        let mut w = NdrWriter::new();
        w.write_param(&Color::Blue).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.as_ref(), &[0x10, 0x00]);
        let mut r = NdrReader::new(bytes);
        assert_eq!(r.read_param::<Color>().unwrap(), Color::Blue);
        assert_eq!(Color::default(), Color::Red);
    }

    #[test]
    fn test_unknown_enum_value() {
        let mut r = NdrReader::new(bytes::Bytes::from_static(&[3, 0]));
        assert!(matches!(
            r.read_param::<Color>(),
            Err(NdrError::InvalidEnumValue(3))
        ));
        assert_eq!(Color::from_u16(2), Some(Color::Green));
    }

    #[test]
    fn test_union_arm_uses_union_alignment() {
        let mut w = NdrWriter::new();
        encode_union(&Number::Small(7), &mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.as_ref(), &[1, 0, 0, 0, 0, 0, 0, 0, 7]);
        let mut r = NdrReader::new(bytes);
        assert_eq!(decode_union::<Number>(&mut r).unwrap(), Number::Small(7));
    }

    #[test]
    fn test_union_bad_discriminant() {
        let mut r = NdrReader::new(bytes::Bytes::from_static(&[9, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert!(matches!(
            decode_union::<Number>(&mut r),
            Err(NdrError::InvalidDiscriminant(9))
        ));
    }
}
