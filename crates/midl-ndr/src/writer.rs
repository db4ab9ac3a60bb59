//! NDR stub writer
//!
//! The writer produces the stub data of a single request or response. All
//! alignment is computed relative to the first byte it writes, which is what
//! NDR20 requires: the PDU header and body fields preceding the stub do not
//! count.

use crate::{NdrContext, NdrEncode, NdrError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// First referent ID handed out for a non-null embedded pointer.
pub const FIRST_REFERENT_ID: u32 = 0x0002_0000;

/// Step between consecutive referent IDs.
const REFERENT_ID_STEP: u32 = 4;

macro_rules! put_primitive {
    ($name:ident, $ty:ty, $le:ident, $be:ident) => {
        #[doc = concat!("Align to ", stringify!($ty), " and write it in context byte order.")]
        pub fn $name(&mut self, value: $ty) {
            self.align(std::mem::size_of::<$ty>());
            if self.ctx.little_endian {
                self.buf.$le(value);
            } else {
                self.buf.$be(value);
            }
        }
    };
}

/// Serializes NDR stub data.
#[derive(Debug)]
pub struct NdrWriter {
    buf: BytesMut,
    ctx: NdrContext,
    next_referent: u32,
}

impl NdrWriter {
    pub fn new() -> Self {
        Self::with_context(NdrContext::new())
    }

    pub fn with_context(ctx: NdrContext) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            ctx,
            next_referent: FIRST_REFERENT_ID,
        }
    }

    pub fn context(&self) -> NdrContext {
        self.ctx
    }

    /// Bytes written so far; also the alignment origin.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Pad with zeros up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        let padding = NdrContext::align_padding(self.buf.len(), alignment);
        self.buf.put_bytes(0, padding);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    put_primitive!(write_u16, u16, put_u16_le, put_u16);
    put_primitive!(write_i16, i16, put_i16_le, put_i16);
    put_primitive!(write_u32, u32, put_u32_le, put_u32);
    put_primitive!(write_i32, i32, put_i32_le, put_i32);
    put_primitive!(write_u64, u64, put_u64_le, put_u64);
    put_primitive!(write_i64, i64, put_i64_le, put_i64);
    put_primitive!(write_f32, f32, put_f32_le, put_f32);
    put_primitive!(write_f64, f64, put_f64_le, put_f64);

    /// Raw bytes, no alignment and no byte swapping.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Conformance, variance or offset field.
    pub fn write_size(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| NdrError::CountOverflow(count))?;
        self.write_u32(count);
        Ok(())
    }

    /// Write the inline representation of an embedded pointer.
    ///
    /// Returns the referent ID written, zero for null. The pointee itself is
    /// written later by the owner's deferred pass.
    pub fn write_referent(&mut self, present: bool) -> u32 {
        let id = if present {
            let id = self.next_referent;
            self.next_referent = self.next_referent.wrapping_add(REFERENT_ID_STEP);
            id
        } else {
            0
        };
        self.write_u32(id);
        id
    }

    /// Write a 16-bit enum.
    pub fn write_enum(&mut self, value: u16) {
        self.write_u16(value);
    }

    /// Write a top-level operation parameter: the value followed
    /// immediately by everything its embedded pointers refer to.
    pub fn write_param<T: NdrEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.ndr_encode(self)?;
        value.ndr_encode_deferred(self)
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for NdrWriter {
    fn default() -> Self {
        Self::new()
    }
}
