//! NDR array types
//!
//! Fixed arrays are plain Rust arrays (`[T; N]`). The types here carry the
//! counts NDR sends ahead of the elements:
//!
//! ```text
//! conformant:          max_count, elements
//! conformant varying:  max_count, offset, actual_count, elements
//! ```
//!
//! When a conformant array is the last member of a structure, the max count
//! moves to the front of the structure. Such structures write the count with
//! [`ConformantArray::encode_conformance`] first and the elements with
//! [`ConformantArray::encode_elements`] where the member sits.

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};
use std::ops::{Deref, DerefMut};

/// `[size_is(n)] T data[]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformantArray<T>(pub Vec<T>);

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self(elements)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for ConformantArray<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self(elements)
    }
}

impl<T> Deref for ConformantArray<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> DerefMut for ConformantArray<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.0
    }
}

impl<T: NdrEncode> ConformantArray<T> {
    pub fn encode_conformance(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_size(self.0.len())
    }

    pub fn encode_elements(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.iter().try_for_each(|item| item.ndr_encode(w))
    }
}

impl<T: NdrDecode> ConformantArray<T> {
    /// Decode `count` elements whose max count was read elsewhere.
    pub fn decode_elements(r: &mut NdrReader, count: usize) -> Result<Self> {
        r.check_count(count, 1)?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(T::ndr_decode(r)?);
        }
        Ok(Self(elements))
    }
}

impl<T: NdrEncode> NdrEncode for ConformantArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        self.encode_conformance(w)?;
        self.encode_elements(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.iter().try_for_each(|item| item.ndr_encode_deferred(w))
    }
}

impl<T: NdrDecode> NdrDecode for ConformantArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = r.read_size()?;
        Self::decode_elements(r, count)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.iter_mut().try_for_each(|item| item.ndr_decode_deferred(r))
    }
}

/// Write `[size_is(count)] T* p` whose count travels as a separate
/// parameter: max count, elements, then their deferred data.
pub fn write_sized<T: NdrEncode>(w: &mut NdrWriter, items: &[T]) -> Result<()> {
    w.write_size(items.len())?;
    items.iter().try_for_each(|item| item.ndr_encode(w))?;
    items.iter().try_for_each(|item| item.ndr_encode_deferred(w))
}

/// Read an array written by [`write_sized`]; its max count must equal the
/// `count` parameter decoded before it.
pub fn read_sized<T: NdrDecode>(r: &mut NdrReader, count: usize) -> Result<Vec<T>> {
    let max_count = r.read_size()?;
    if max_count != count {
        return Err(NdrError::ArraySizeMismatch {
            expected: count,
            got: max_count,
        });
    }
    let mut array = ConformantArray::<T>::decode_elements(r, max_count)?;
    array.ndr_decode_deferred(r)?;
    Ok(array.into_inner())
}

/// `[size_is(max), length_is(n)] T data[]`
///
/// Encoded with offset zero and `max_count` at least the element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformantVaryingArray<T> {
    pub max_count: usize,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: elements.len(),
            elements,
        }
    }

    /// Reserve room for `max_count` elements while transmitting fewer.
    pub fn with_capacity(max_count: usize, elements: Vec<T>) -> Self {
        Self {
            max_count: max_count.max(elements.len()),
            elements,
        }
    }
}

impl<T> Default for ConformantVaryingArray<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Validate a (max, offset, actual) triple read from the wire.
pub(crate) fn check_variance(max_count: u32, offset: u32, actual_count: u32) -> Result<()> {
    if u64::from(offset) + u64::from(actual_count) > u64::from(max_count) {
        return Err(NdrError::ConformanceMismatch {
            max_count,
            offset,
            actual_count,
        });
    }
    Ok(())
}

impl<T: NdrEncode> NdrEncode for ConformantVaryingArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_size(self.max_count.max(self.elements.len()))?;
        w.write_size(0)?;
        w.write_size(self.elements.len())?;
        self.elements.iter().try_for_each(|item| item.ndr_encode(w))
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.elements
            .iter()
            .try_for_each(|item| item.ndr_encode_deferred(w))
    }
}

impl<T: NdrDecode> NdrDecode for ConformantVaryingArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let max_count = r.read_u32()?;
        let offset = r.read_u32()?;
        let actual_count = r.read_u32()?;
        check_variance(max_count, offset, actual_count)?;
        let elements = ConformantArray::decode_elements(r, actual_count as usize)?.0;
        Ok(Self {
            max_count: max_count as usize,
            elements,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.elements
            .iter_mut()
            .try_for_each(|item| item.ndr_decode_deferred(r))
    }
}

/// `[length_is(n)] T data[N]`: offset and actual count, no max count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T>(pub Vec<T>);

impl<T> Default for VaryingArray<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<T>> for VaryingArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self(elements)
    }
}

impl<T> Deref for VaryingArray<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T: NdrEncode> NdrEncode for VaryingArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_size(0)?;
        w.write_size(self.0.len())?;
        self.0.iter().try_for_each(|item| item.ndr_encode(w))
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.iter().try_for_each(|item| item.ndr_encode_deferred(w))
    }
}

impl<T: NdrDecode> NdrDecode for VaryingArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let offset = r.read_u32()?;
        let actual_count = r.read_u32()?;
        if offset != 0 {
            return Err(NdrError::ConformanceMismatch {
                max_count: actual_count,
                offset,
                actual_count,
            });
        }
        Ok(Self(ConformantArray::decode_elements(r, actual_count as usize)?.0))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.iter_mut().try_for_each(|item| item.ndr_decode_deferred(r))
    }
}
