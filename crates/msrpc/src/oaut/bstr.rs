//! BSTR as it travels over the wire (MS-OAUT 2.2.23)
//!
//! ```text
//! typedef struct _FLAGGED_WORD_BLOB {
//!     unsigned long cBytes;
//!     unsigned long clSize;
//!     [size_is(clSize)] unsigned short asData[];
//! } FLAGGED_WORD_BLOB;
//! typedef [unique] FLAGGED_WORD_BLOB* BSTR;
//! ```

use midl_ndr::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, UniquePtr};
use std::fmt;

/// UTF-16 payload of a BSTR, without terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlaggedWordBlob {
    pub data: Vec<u16>,
}

impl FlaggedWordBlob {
    pub fn new(s: &str) -> Self {
        Self {
            data: s.encode_utf16().collect(),
        }
    }

    /// Byte length sent in `cBytes`.
    pub fn byte_len(&self) -> usize {
        self.data.len() * 2
    }
}

impl NdrEncode for FlaggedWordBlob {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_size(self.data.len())?;
        w.write_size(self.byte_len())?;
        w.write_size(self.data.len())?;
        self.data.iter().try_for_each(|c| c.ndr_encode(w))
    }
}

impl NdrDecode for FlaggedWordBlob {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let max_count = r.read_size()?;
        let _byte_len = r.read_u32()?;
        let count = r.read_size()?;
        if count != max_count {
            return Err(NdrError::ArraySizeMismatch {
                expected: max_count,
                got: count,
            });
        }
        r.check_count(count, 2)?;
        let data = (0..count).map(|_| r.read_u16()).collect::<midl_ndr::Result<_>>()?;
        Ok(Self { data })
    }
}

/// `BSTR`: a nullable string. A null BSTR and an empty one are distinct
/// on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bstr(pub UniquePtr<FlaggedWordBlob>);

impl Bstr {
    pub fn new(s: &str) -> Self {
        Self(UniquePtr::new(FlaggedWordBlob::new(s)))
    }

    pub fn null() -> Self {
        Self(UniquePtr::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// The decoded string; `None` for a null BSTR.
    pub fn to_string_lossy(&self) -> Option<String> {
        self.0.as_ref().map(|blob| String::from_utf16_lossy(&blob.data))
    }

    /// The decoded string, rejecting unpaired surrogates.
    pub fn try_to_string(&self) -> midl_ndr::Result<Option<String>> {
        self.0
            .as_ref()
            .map(|blob| {
                char::decode_utf16(blob.data.iter().copied())
                    .collect::<std::result::Result<String, _>>()
                    .map_err(NdrError::from)
            })
            .transpose()
    }
}

impl From<&str> for Bstr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Option<&str>> for Bstr {
    fn from(s: Option<&str>) -> Self {
        s.map_or_else(Self::null, Self::new)
    }
}

impl fmt::Display for Bstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_string_lossy() {
            Some(s) => f.write_str(&s),
            None => f.write_str("<null>"),
        }
    }
}

impl NdrEncode for Bstr {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.0.ndr_encode_deferred(w)
    }
}

impl NdrDecode for Bstr {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self(UniquePtr::ndr_decode(r)?))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        self.0.ndr_decode_deferred(r)
    }
}
