//! Byte order and alignment rules shared by the writer and the reader.

/// Integer representation bit in the first data representation octet.
const DREP_LITTLE_ENDIAN: u8 = 0x10;

/// NDR transfer context.
///
/// NDR20 has two variable properties that matter to this runtime: the
/// integer byte order negotiated through the PDU data representation and
/// the stub-relative position used for natural alignment. The position
/// lives in the writer/reader; the byte order lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrContext {
    pub little_endian: bool,
}

impl NdrContext {
    /// Little-endian context, the representation every Windows peer sends.
    pub fn new() -> Self {
        Self { little_endian: true }
    }

    pub fn big_endian() -> Self {
        Self { little_endian: false }
    }

    pub fn with_byte_order(little_endian: bool) -> Self {
        Self { little_endian }
    }

    /// Derive the context from the first octet of a DCE/RPC data
    /// representation label.
    pub fn from_drep(int_rep: u8) -> Self {
        Self {
            little_endian: int_rep & DREP_LITTLE_ENDIAN != 0,
        }
    }

    /// Padding needed to move `position` to the next multiple of `alignment`.
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment <= 1 {
            return 0;
        }
        match position % alignment {
            0 => 0,
            rem => alignment - rem,
        }
    }
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}
