//! String bindings and the dual string array (MS-DCOM 2.2.19)
//!
//! A DUALSTRINGARRAY is a flat array of 16-bit words holding two
//! zero-terminated sections: string bindings (network addresses) and
//! security bindings. `wSecurityOffset` is the word index where the
//! security section starts.

use super::error::{DcomError, Result};
use midl_ndr::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter};
use std::fmt;

/// Protocol tower identifiers
pub mod protocol_id {
    pub const NCACN_IP_TCP: u16 = 0x07;
    pub const NCACN_NP: u16 = 0x0F;
    pub const NCALRPC: u16 = 0x10;
    pub const NCACN_HTTP: u16 = 0x1F;
}

/// Authentication services
pub mod authn_svc {
    pub const NONE: u16 = 0;
    pub const GSS_NEGOTIATE: u16 = 9;
    pub const WINNT: u16 = 10;
    pub const GSS_KERBEROS: u16 = 16;
}

/// `wAuthzSvc` value senders must use.
pub const AUTHZ_NONE: u16 = 0xFFFF;

/// STRINGBINDING (MS-DCOM 2.2.19.3)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringBinding {
    pub tower_id: u16,
    pub network_addr: String,
}

impl StringBinding {
    pub fn new(tower_id: u16, network_addr: impl Into<String>) -> Self {
        Self {
            tower_id,
            network_addr: network_addr.into(),
        }
    }

    /// `ncacn_ip_tcp` binding, e.g. `10.0.0.1[1025]`
    pub fn tcp(addr: &str) -> Self {
        Self::new(protocol_id::NCACN_IP_TCP, addr)
    }

    fn push_words(&self, words: &mut Vec<u16>) {
        words.push(self.tower_id);
        words.extend(self.network_addr.encode_utf16());
        words.push(0);
    }
}

impl fmt::Display for StringBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tower_id {
            protocol_id::NCACN_IP_TCP => write!(f, "ncacn_ip_tcp:{}", self.network_addr),
            protocol_id::NCACN_NP => write!(f, "ncacn_np:{}", self.network_addr),
            protocol_id::NCACN_HTTP => write!(f, "ncacn_http:{}", self.network_addr),
            other => write!(f, "tower(0x{:02x}):{}", other, self.network_addr),
        }
    }
}

/// SECURITYBINDING (MS-DCOM 2.2.19.4)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityBinding {
    pub authn_svc: u16,
    pub authz_svc: u16,
    pub principal_name: String,
}

impl SecurityBinding {
    pub fn new(authn_svc: u16, principal_name: impl Into<String>) -> Self {
        Self {
            authn_svc,
            authz_svc: AUTHZ_NONE,
            principal_name: principal_name.into(),
        }
    }

    fn push_words(&self, words: &mut Vec<u16>) {
        words.push(self.authn_svc);
        words.push(self.authz_svc);
        words.extend(self.principal_name.encode_utf16());
        words.push(0);
    }
}

/// DUALSTRINGARRAY (MS-DCOM 2.2.19.1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DualStringArray {
    pub string_bindings: Vec<StringBinding>,
    pub security_bindings: Vec<SecurityBinding>,
}

/// Split a zero-terminated section into its entries, each of which is a
/// zero-terminated run of words.
fn split_section(words: &[u16], prefix: usize) -> Result<Vec<(&[u16], &[u16])>> {
    let mut entries = Vec::new();
    let mut pos = 0;
    while pos < words.len() && words[pos] != 0 {
        let head_end = pos + prefix;
        let rest = words
            .get(head_end..)
            .ok_or_else(|| DcomError::InvalidStringBinding("truncated binding".to_string()))?;
        let len = rest
            .iter()
            .position(|&w| w == 0)
            .ok_or_else(|| DcomError::InvalidStringBinding("unterminated binding".to_string()))?;
        entries.push((&words[pos..head_end], &rest[..len]));
        pos = head_end + len + 1;
    }
    Ok(entries)
}

fn wide(units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|e| DcomError::InvalidStringBinding(e.to_string()))
}

impl DualStringArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single TCP string binding, no security bindings.
    pub fn with_tcp_binding(addr: &str) -> Self {
        Self {
            string_bindings: vec![StringBinding::tcp(addr)],
            security_bindings: Vec::new(),
        }
    }

    pub fn add_string_binding(&mut self, binding: StringBinding) {
        self.string_bindings.push(binding);
    }

    pub fn add_security_binding(&mut self, binding: SecurityBinding) {
        self.security_bindings.push(binding);
    }

    /// `aStringArray` and `wSecurityOffset`.
    ///
    /// An empty section is written as two zero words.
    pub fn to_words(&self) -> (Vec<u16>, u16) {
        let mut words = Vec::new();
        self.string_bindings.iter().for_each(|b| b.push_words(&mut words));
        if self.string_bindings.is_empty() {
            words.push(0);
        }
        words.push(0);
        let security_offset = words.len() as u16;
        self.security_bindings.iter().for_each(|b| b.push_words(&mut words));
        if self.security_bindings.is_empty() {
            words.push(0);
        }
        words.push(0);
        (words, security_offset)
    }

    pub fn from_words(words: &[u16], security_offset: u16) -> Result<Self> {
        let split = usize::from(security_offset);
        if split > words.len() {
            return Err(DcomError::InvalidStringBinding(format!(
                "security offset {} beyond {} entries",
                split,
                words.len()
            )));
        }
        let (strings, security) = words.split_at(split);

        let string_bindings = split_section(strings, 1)?
            .into_iter()
            .map(|(head, addr)| Ok(StringBinding::new(head[0], wide(addr)?)))
            .collect::<Result<Vec<_>>>()?;
        let security_bindings = split_section(security, 2)?
            .into_iter()
            .map(|(head, name)| {
                Ok(SecurityBinding {
                    authn_svc: head[0],
                    authz_svc: head[1],
                    principal_name: wide(name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            string_bindings,
            security_bindings,
        })
    }

    /// `wNumEntries`, `wSecurityOffset` and the words, without the NDR
    /// conformance count. This is how the array appears inside an OBJREF.
    pub fn encode_body(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        let (words, security_offset) = self.to_words();
        w.write_u16(words.len() as u16);
        w.write_u16(security_offset);
        words.into_iter().for_each(|word| w.write_u16(word));
        Ok(())
    }

    pub fn decode_body(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let num_entries = usize::from(r.read_u16()?);
        Self::decode_words(r, num_entries)
    }

    fn decode_words(r: &mut NdrReader, num_entries: usize) -> midl_ndr::Result<Self> {
        let security_offset = r.read_u16()?;
        r.check_count(num_entries, 2)?;
        let mut words = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            words.push(r.read_u16()?);
        }
        Self::from_words(&words, security_offset).map_err(|e| NdrError::InvalidString(e.to_string()))
    }

    /// First TCP address, if any.
    pub fn tcp_address(&self) -> Option<&str> {
        self.string_bindings
            .iter()
            .find(|b| b.tower_id == protocol_id::NCACN_IP_TCP)
            .map(|b| b.network_addr.as_str())
    }
}

/// Conformant structure: the count of `aStringArray` comes first.
impl NdrEncode for DualStringArray {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        let (words, _) = self.to_words();
        w.write_size(words.len())?;
        self.encode_body(w)
    }
}

impl NdrDecode for DualStringArray {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let max_count = r.read_size()?;
        let num_entries = usize::from(r.read_u16()?);
        if num_entries != max_count {
            return Err(NdrError::ArraySizeMismatch {
                expected: max_count,
                got: num_entries,
            });
        }
        Self::decode_words(r, num_entries)
    }
}
