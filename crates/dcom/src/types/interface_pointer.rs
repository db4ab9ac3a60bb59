//! MInterfacePointer (MS-DCOM 2.2.14)
//!
//! How interface pointers cross an NDR boundary: a conformant structure
//! with a byte count followed by that many bytes of OBJREF.

use super::error::Result;
use super::objref::ObjRef;
use bytes::Bytes;
use midl_ndr::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MInterfacePointer {
    /// OBJREF bytes (`abData`)
    pub data: Bytes,
}

impl MInterfacePointer {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    pub fn from_objref(objref: &ObjRef) -> Self {
        Self::new(objref.to_bytes())
    }

    pub fn objref(&self) -> Result<ObjRef> {
        ObjRef::from_bytes(&self.data)
    }
}

impl From<ObjRef> for MInterfacePointer {
    fn from(objref: ObjRef) -> Self {
        Self::from_objref(&objref)
    }
}

impl NdrEncode for MInterfacePointer {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_size(self.data.len())?;
        w.write_size(self.data.len())?;
        w.write_bytes(&self.data);
        Ok(())
    }
}

impl NdrDecode for MInterfacePointer {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let max_count = r.read_size()?;
        let count = r.read_size()?;
        if count != max_count {
            return Err(NdrError::ArraySizeMismatch {
                expected: max_count,
                got: count,
            });
        }
        r.check_count(count, 1)?;
        Ok(Self {
            data: r.read_bytes(count)?,
        })
    }
}
