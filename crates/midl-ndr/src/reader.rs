//! NDR stub reader

use crate::error::MAX_NDR_ALLOCATION_SIZE;
use crate::{NdrContext, NdrDecode, NdrError, Result};
use bytes::Bytes;

macro_rules! get_primitive {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Skip alignment padding and read a ", stringify!($ty), ".")]
        pub fn $name(&mut self) -> Result<$ty> {
            const SIZE: usize = std::mem::size_of::<$ty>();
            self.align(SIZE)?;
            let mut raw = [0u8; SIZE];
            raw.copy_from_slice(self.take(SIZE)?);
            Ok(if self.ctx.little_endian {
                <$ty>::from_le_bytes(raw)
            } else {
                <$ty>::from_be_bytes(raw)
            })
        }
    };
}

/// Deserializes NDR stub data.
#[derive(Debug, Clone)]
pub struct NdrReader {
    buf: Bytes,
    pos: usize,
    ctx: NdrContext,
}

impl NdrReader {
    pub fn new(buf: Bytes) -> Self {
        Self::with_context(buf, NdrContext::new())
    }

    pub fn with_context(buf: Bytes, ctx: NdrContext) -> Self {
        Self { buf, pos: 0, ctx }
    }

    pub fn context(&self) -> NdrContext {
        self.ctx
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        if self.remaining() < len {
            return Err(NdrError::BufferUnderflow {
                needed: len,
                have: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    /// Skip padding up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.pos, alignment);
        self.take(padding).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    get_primitive!(read_u16, u16);
    get_primitive!(read_i16, i16);
    get_primitive!(read_u32, u32);
    get_primitive!(read_i32, i32);
    get_primitive!(read_u64, u64);
    get_primitive!(read_i64, i64);
    get_primitive!(read_f32, f32);
    get_primitive!(read_f64, f64);

    /// Zero-copy slice of the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.take(len)?;
        Ok(self.buf.slice(self.pos - len..self.pos))
    }

    pub fn read_size(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Raw referent ID of an embedded pointer; zero means null.
    pub fn read_referent(&mut self) -> Result<u32> {
        self.read_u32()
    }

    pub fn read_enum(&mut self) -> Result<u16> {
        self.read_u16()
    }

    /// Reject a wire count before anything is allocated for it.
    ///
    /// `element_size` is the smallest wire size of one element, so a count
    /// that cannot possibly be backed by the remaining input fails early.
    pub fn check_count(&self, count: usize, element_size: usize) -> Result<()> {
        let needed = count.saturating_mul(element_size.max(1));
        if needed > MAX_NDR_ALLOCATION_SIZE {
            return Err(NdrError::AllocationLimitExceeded {
                requested: needed,
                limit: MAX_NDR_ALLOCATION_SIZE,
            });
        }
        if needed > self.remaining() {
            return Err(NdrError::BufferUnderflow {
                needed,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read a top-level operation parameter together with its pointees.
    pub fn read_param<T: NdrDecode>(&mut self) -> Result<T> {
        let mut value = T::ndr_decode(self)?;
        value.ndr_decode_deferred(self)?;
        Ok(value)
    }
}
