//! STDOBJREF structure (MS-DCOM 2.2.18.2)
//!
//! Standard object reference: names an interface on an object in some
//! object exporter.

use super::identifiers::{Ipid, Oid, Oxid};
use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};

/// STDOBJREF flags (SORF_*)
pub mod flags {
    pub const SORF_NULL: u32 = 0x0000_0000;
    /// The client must not ping the object
    pub const SORF_NOPING: u32 = 0x0000_1000;
}

/// Standard Object Reference (40 bytes)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StdObjRef {
    /// SORF_* flags
    pub flags: u32,
    /// Number of public references carried by this reference
    pub public_refs: u32,
    pub oxid: Oxid,
    pub oid: Oid,
    pub ipid: Ipid,
}

impl StdObjRef {
    pub const SIZE: usize = 40;

    pub fn new(oxid: Oxid, oid: Oid, ipid: Ipid, public_refs: u32) -> Self {
        Self {
            flags: flags::SORF_NULL,
            public_refs,
            oxid,
            oid,
            ipid,
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_noping(&self) -> bool {
        self.flags & flags::SORF_NOPING != 0
    }
}

/// Aligned to 8 as a whole because of the 64-bit identifiers.
impl NdrEncode for StdObjRef {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.align(8);
        w.write_u32(self.flags);
        w.write_u32(self.public_refs);
        self.oxid.ndr_encode(w)?;
        self.oid.ndr_encode(w)?;
        self.ipid.ndr_encode(w)
    }
}

impl NdrDecode for StdObjRef {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        r.align(8)?;
        Ok(Self {
            flags: r.read_u32()?,
            public_refs: r.read_u32()?,
            oxid: Oxid::ndr_decode(r)?,
            oid: Oid::ndr_decode(r)?,
            ipid: Ipid::ndr_decode(r)?,
        })
    }
}
