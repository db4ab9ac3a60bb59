//! NDR string types
//!
//! `[string]` data is a conformant varying array whose counts include the
//! terminating NUL:
//!
//! ```text
//! max_count: u32
//! offset: u32        # always 0 when encoding
//! actual_count: u32
//! chars[actual_count]
//! ```

use crate::arrays::check_variance;
use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

fn read_string_header(r: &mut NdrReader, char_size: usize) -> Result<usize> {
    let max_count = r.read_u32()?;
    let offset = r.read_u32()?;
    let actual_count = r.read_u32()?;
    check_variance(max_count, offset, actual_count)?;
    r.check_count(actual_count as usize, char_size)?;
    Ok(actual_count as usize)
}

/// `[string] wchar_t*`, transmitted as UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct NdrWString(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NdrWString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NdrWString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl NdrEncode for NdrWString {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let units: Vec<u16> = self.0.encode_utf16().chain(std::iter::once(0)).collect();
        w.write_size(units.len())?;
        w.write_size(0)?;
        w.write_size(units.len())?;
        for unit in units {
            w.write_u16(unit);
        }
        Ok(())
    }
}

impl NdrDecode for NdrWString {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = read_string_header(r, 2)?;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(r.read_u16()?);
        }
        if units.last() == Some(&0) {
            units.pop();
        }
        let s = char::decode_utf16(units.iter().copied()).collect::<std::result::Result<String, _>>()?;
        Ok(Self(s))
    }
}

/// `[string] char*`, transmitted as single bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct NdrString(pub String);

impl NdrString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NdrString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl NdrEncode for NdrString {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let len = self.0.len() + 1;
        w.write_size(len)?;
        w.write_size(0)?;
        w.write_size(len)?;
        w.write_bytes(self.0.as_bytes());
        w.write_u8(0);
        Ok(())
    }
}

impl NdrDecode for NdrString {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = read_string_header(r, 1)?;
        let mut raw = r.read_bytes(count)?.to_vec();
        if raw.last() == Some(&0) {
            raw.pop();
        }
        Ok(Self(String::from_utf8(raw)?))
    }
}
