//! NDR pointer types
//!
//! These wrappers model pointers embedded in structures, arrays and unions,
//! plus top-level `[unique]` parameters. A top-level `[ref]` parameter has no
//! wire representation and is modelled by the plain value.
//!
//! - `RefPtr` (`[ref]`): never null, 4-byte referent ID, pointee deferred
//! - `UniquePtr` (`[unique]`): nullable, 4-byte referent ID, pointee deferred
//! - `FullPtr` (`[ptr]`): like `UniquePtr` on the wire. Aliased pointees are
//!   sent once per pointer; no full-pointer table is kept.

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};
use std::ops::{Deref, DerefMut};

fn encode_pointee<T: NdrEncode>(value: Option<&T>, w: &mut NdrWriter) -> Result<()> {
    match value {
        Some(v) => {
            v.ndr_encode(w)?;
            v.ndr_encode_deferred(w)
        }
        None => Ok(()),
    }
}

fn decode_pointee<T: NdrDecode>(slot: Option<&mut Box<T>>, r: &mut NdrReader) -> Result<()> {
    if let Some(slot) = slot {
        let mut value = T::ndr_decode(r)?;
        value.ndr_decode_deferred(r)?;
        **slot = value;
    }
    Ok(())
}

/// Embedded reference pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_referent(true);
        Ok(())
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_pointee(Some(&self.0), w)
    }
}

impl<T: NdrDecode + Default> NdrDecode for RefPtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        if r.read_referent()? == 0 {
            return Err(NdrError::NullRefPointer);
        }
        Ok(Self(T::default()))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        let mut value = T::ndr_decode(r)?;
        value.ndr_decode_deferred(r)?;
        self.0 = value;
        Ok(())
    }
}

macro_rules! nullable_pointer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name<T>(pub Option<Box<T>>);

        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self(Some(Box::new(value)))
            }

            pub fn null() -> Self {
                Self(None)
            }

            pub fn is_null(&self) -> bool {
                self.0.is_none()
            }

            pub fn as_ref(&self) -> Option<&T> {
                self.0.as_deref()
            }

            pub fn as_mut(&mut self) -> Option<&mut T> {
                self.0.as_deref_mut()
            }

            pub fn into_option(self) -> Option<T> {
                self.0.map(|b| *b)
            }

            pub fn from_option(value: Option<T>) -> Self {
                Self(value.map(Box::new))
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self(None)
            }
        }

        impl<T> From<Option<T>> for $name<T> {
            fn from(value: Option<T>) -> Self {
                Self::from_option(value)
            }
        }

        impl<T: NdrEncode> NdrEncode for $name<T> {
            fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
                w.write_referent(self.0.is_some());
                Ok(())
            }

            fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
                encode_pointee(self.0.as_deref(), w)
            }
        }

        impl<T: NdrDecode + Default> NdrDecode for $name<T> {
            fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                Ok(match r.read_referent()? {
                    0 => Self(None),
                    _ => Self(Some(Box::default())),
                })
            }

            fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
                decode_pointee(self.0.as_mut(), r)
            }
        }
    };
}

nullable_pointer!(
    /// Unique pointer: nullable, never aliased.
    UniquePtr
);

nullable_pointer!(
    /// Full pointer.
    FullPtr
);
