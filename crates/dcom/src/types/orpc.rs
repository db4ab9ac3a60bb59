//! ORPC (Object RPC) header types (MS-DCOM 2.2.11 - 2.2.14)
//!
//! Every ORPC request starts with an `ORPCTHIS` and every response with an
//! `ORPCTHAT`. Both may point to an array of extents carrying out-of-band
//! data such as error information.

use super::identifiers::{generate_uuid, Cid};
use dcerpc::Uuid;
use midl_ndr::{ConformantArray, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, UniquePtr};

/// COM version structure (MS-DCOM 2.2.11)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct ComVersion {
    pub major: u16,
    pub minor: u16,
}

impl ComVersion {
    pub const SIZE: usize = 4;

    /// DCOM version 5.1 (Windows 2000)
    pub const DCOM_5_1: Self = Self { major: 5, minor: 1 };
    /// DCOM version 5.4 (Windows XP/2003)
    pub const DCOM_5_4: Self = Self { major: 5, minor: 4 };
    /// DCOM version 5.6 (Windows Vista)
    pub const DCOM_5_6: Self = Self { major: 5, minor: 6 };
    /// DCOM version 5.7 (Windows 7 and later)
    pub const DCOM_5_7: Self = Self { major: 5, minor: 7 };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for ComVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl NdrEncode for ComVersion {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u16(self.major);
        w.write_u16(self.minor);
        Ok(())
    }
}

impl NdrDecode for ComVersion {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            major: r.read_u16()?,
            minor: r.read_u16()?,
        })
    }
}

/// `ORPC_EXTENT`: a conformant structure whose data is padded to 8 bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcExtent {
    pub id: Uuid,
    /// Payload, without the padding.
    pub data: Vec<u8>,
}

impl OrpcExtent {
    pub fn new(id: Uuid, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    fn padded_len(&self) -> usize {
        (self.data.len() + 7) & !7
    }
}

impl NdrEncode for OrpcExtent {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        let padded = self.padded_len();
        w.write_size(padded)?;
        self.id.ndr_encode(w)?;
        w.write_size(self.data.len())?;
        w.write_bytes(&self.data);
        w.write_bytes(&vec![0; padded - self.data.len()]);
        Ok(())
    }
}

impl NdrDecode for OrpcExtent {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let max_count = r.read_size()?;
        let id = Uuid::ndr_decode(r)?;
        let size = r.read_size()?;
        if size > max_count {
            return Err(NdrError::ArraySizeMismatch {
                expected: max_count,
                got: size,
            });
        }
        r.check_count(max_count, 1)?;
        let raw = r.read_bytes(max_count)?;
        Ok(Self {
            id,
            data: raw[..size].to_vec(),
        })
    }
}

/// `ORPC_EXTENT_ARRAY`
///
/// `extent` points to `(size + 1) & !1` slots; `size` of them are
/// non-null and any remaining slot is a null pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcExtentArray {
    pub size: u32,
    pub reserved: u32,
    pub extent: UniquePtr<ConformantArray<UniquePtr<OrpcExtent>>>,
}

impl OrpcExtentArray {
    pub fn new(extents: Vec<OrpcExtent>) -> Self {
        let size = extents.len() as u32;
        let mut slots: Vec<UniquePtr<OrpcExtent>> = extents.into_iter().map(UniquePtr::new).collect();
        if slots.len() % 2 == 1 {
            slots.push(UniquePtr::null());
        }
        let extent = if slots.is_empty() {
            UniquePtr::null()
        } else {
            UniquePtr::new(ConformantArray::new(slots))
        };
        Self {
            size,
            reserved: 0,
            extent,
        }
    }

    /// Non-null extents in wire order.
    pub fn extents(&self) -> impl Iterator<Item = &OrpcExtent> {
        self.extent
            .as_ref()
            .into_iter()
            .flat_map(|slots| slots.iter())
            .filter_map(|slot| slot.as_ref())
    }

    pub fn find(&self, id: &Uuid) -> Option<&OrpcExtent> {
        self.extents().find(|e| e.id == *id)
    }
}

impl NdrEncode for OrpcExtentArray {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u32(self.size);
        w.write_u32(self.reserved);
        self.extent.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.extent.ndr_encode_deferred(w)
    }
}

impl NdrDecode for OrpcExtentArray {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            size: r.read_u32()?,
            reserved: r.read_u32()?,
            extent: UniquePtr::ndr_decode(r)?,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        self.extent.ndr_decode_deferred(r)
    }
}

/// ORPCTHIS (MS-DCOM 2.2.13.1), the implicit first `[in]` parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcThis {
    pub version: ComVersion,
    /// Zero for ORPC invocations.
    pub flags: u32,
    pub reserved1: u32,
    pub cid: Cid,
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThis {
    /// Header for a new call: [`crate::DCOM_VERSION`] and a fresh causality ID.
    pub fn new() -> Self {
        Self::with_causality(generate_uuid())
    }

    pub fn with_causality(cid: Cid) -> Self {
        Self {
            version: crate::DCOM_VERSION,
            cid,
            ..Default::default()
        }
    }

    pub fn with_extensions(mut self, extents: Vec<OrpcExtent>) -> Self {
        self.extensions = UniquePtr::new(OrpcExtentArray::new(extents));
        self
    }
}

impl NdrEncode for OrpcThis {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.version.ndr_encode(w)?;
        w.write_u32(self.flags);
        w.write_u32(self.reserved1);
        self.cid.ndr_encode(w)?;
        self.extensions.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.extensions.ndr_encode_deferred(w)
    }
}

impl NdrDecode for OrpcThis {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            version: ComVersion::ndr_decode(r)?,
            flags: r.read_u32()?,
            reserved1: r.read_u32()?,
            cid: Uuid::ndr_decode(r)?,
            extensions: UniquePtr::ndr_decode(r)?,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        self.extensions.ndr_decode_deferred(r)
    }
}

/// ORPCTHAT (MS-DCOM 2.2.13.2), the implicit first `[out]` parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrpcThat {
    pub flags: u32,
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThat {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NdrEncode for OrpcThat {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u32(self.flags);
        self.extensions.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.extensions.ndr_encode_deferred(w)
    }
}

impl NdrDecode for OrpcThat {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            flags: r.read_u32()?,
            extensions: UniquePtr::ndr_decode(r)?,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        self.extensions.ndr_decode_deferred(r)
    }
}

/// Well-known extent identifiers
pub mod extent_id {
    use dcerpc::Uuid;

    /// Error information extension (MS-DCOM 2.2.21.2)
    pub const ERROR_INFO: Uuid =
        Uuid::from_fields(0xf1f1_9680, 0x4d2a, 0x11ce, [0xa6, 0x6a, 0x00, 0x20, 0xaf, 0x6e, 0x72, 0xf4]);
}
