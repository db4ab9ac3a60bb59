//! OBJREF structure (MS-DCOM 2.2.18)
//!
//! OBJREF is the marshaled form of an interface pointer. It is a packed
//! little-endian byte layout rather than NDR; it travels inside an
//! `MInterfacePointer` as an opaque blob.
//!
//! ```text
//! signature "MEOW" | flags | iid | variant body
//! ```

use super::error::{DcomError, Result};
use super::identifiers::{Clsid, Iid, Ipid, Oid, Oxid};
use super::stdobjref::{flags as sorf, StdObjRef};
use super::stringbinding::DualStringArray;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use dcerpc::Uuid;

/// OBJREF signature, "MEOW" read as a little-endian u32
pub const OBJREF_SIGNATURE: u32 = 0x574F_454D;

/// OBJREF flags selecting the variant
pub mod objref_flags {
    pub const OBJREF_STANDARD: u32 = 0x0000_0001;
    pub const OBJREF_HANDLER: u32 = 0x0000_0002;
    pub const OBJREF_CUSTOM: u32 = 0x0000_0004;
    pub const OBJREF_EXTENDED: u32 = 0x0000_0008;
}

fn need(buf: &impl Buf, n: usize, what: &str) -> Result<()> {
    if buf.remaining() < n {
        return Err(DcomError::InvalidObjRef(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            n,
            buf.remaining()
        )));
    }
    Ok(())
}

fn put_uuid(buf: &mut impl BufMut, uuid: &Uuid) {
    buf.put_slice(&uuid.to_bytes_le());
}

fn get_uuid(buf: &mut impl Buf, what: &str) -> Result<Uuid> {
    need(buf, 16, what)?;
    let mut raw = [0u8; 16];
    buf.copy_to_slice(&mut raw);
    Uuid::from_bytes_le(&raw).ok_or_else(|| DcomError::InvalidObjRef(format!("bad {}", what)))
}

fn put_std(buf: &mut impl BufMut, std: &StdObjRef) {
    buf.put_u32_le(std.flags);
    buf.put_u32_le(std.public_refs);
    buf.put_u64_le(std.oxid.0);
    buf.put_u64_le(std.oid.0);
    put_uuid(buf, &std.ipid.0);
}

fn get_std(buf: &mut impl Buf) -> Result<StdObjRef> {
    need(buf, StdObjRef::SIZE, "STDOBJREF")?;
    let flags = buf.get_u32_le();
    let public_refs = buf.get_u32_le();
    let oxid = Oxid(buf.get_u64_le());
    let oid = Oid(buf.get_u64_le());
    let ipid = Ipid(get_uuid(buf, "IPID")?);
    Ok(StdObjRef {
        flags,
        public_refs,
        oxid,
        oid,
        ipid,
    })
}

fn put_dsa(buf: &mut impl BufMut, dsa: &DualStringArray) {
    let (words, security_offset) = dsa.to_words();
    buf.put_u16_le(words.len() as u16);
    buf.put_u16_le(security_offset);
    words.iter().for_each(|w| buf.put_u16_le(*w));
}

fn get_dsa(buf: &mut impl Buf) -> Result<DualStringArray> {
    need(buf, 4, "DUALSTRINGARRAY")?;
    let num_entries = usize::from(buf.get_u16_le());
    let security_offset = buf.get_u16_le();
    need(buf, num_entries * 2, "DUALSTRINGARRAY")?;
    let words: Vec<u16> = (0..num_entries).map(|_| buf.get_u16_le()).collect();
    DualStringArray::from_words(&words, security_offset)
}

/// OBJREF_STANDARD (MS-DCOM 2.2.18.4)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjRefStandard {
    pub std: StdObjRef,
    /// Bindings of the object resolver that can resolve `std.oxid`
    pub resolver_addr: DualStringArray,
}

/// OBJREF_HANDLER (MS-DCOM 2.2.18.5)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjRefHandler {
    pub std: StdObjRef,
    pub clsid: Clsid,
    pub resolver_addr: DualStringArray,
}

/// OBJREF_CUSTOM (MS-DCOM 2.2.18.6)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjRefCustom {
    /// CLSID of the unmarshaler
    pub clsid: Clsid,
    pub cb_extension: u32,
    /// Everything after the fixed fields, up to the end of the OBJREF.
    pub data: Bytes,
}

/// One DATAELEMENT of an extended OBJREF (MS-DCOM 2.2.18.8)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataElement {
    pub data_id: Uuid,
    pub data: Bytes,
}

/// OBJREF_EXTENDED (MS-DCOM 2.2.18.7)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjRefExtended {
    pub std: StdObjRef,
    pub resolver_addr: DualStringArray,
    pub elements: Vec<DataElement>,
}

impl ObjRefExtended {
    /// "VYSN", sent in both signature fields
    pub const SIGNATURE: u32 = 0x4E53_5956;
}

/// Variant body of an OBJREF.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjRefBody {
    Standard(ObjRefStandard),
    Handler(ObjRefHandler),
    Custom(ObjRefCustom),
    Extended(ObjRefExtended),
}

/// A marshaled interface pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjRef {
    /// Interface the reference is for
    pub iid: Iid,
    pub body: ObjRefBody,
}

impl ObjRef {
    pub const HEADER_SIZE: usize = 8 + 16;

    pub fn standard(iid: Iid, std: StdObjRef, resolver_addr: DualStringArray) -> Self {
        Self {
            iid,
            body: ObjRefBody::Standard(ObjRefStandard { std, resolver_addr }),
        }
    }

    /// Reference to an object the peer must not ping, with no resolver
    /// bindings.
    pub fn local(iid: Iid, oxid: Oxid, oid: Oid, ipid: Ipid) -> Self {
        let std = StdObjRef::new(oxid, oid, ipid, 1).with_flags(sorf::SORF_NOPING);
        Self::standard(iid, std, DualStringArray::new())
    }

    pub fn flags(&self) -> u32 {
        match self.body {
            ObjRefBody::Standard(_) => objref_flags::OBJREF_STANDARD,
            ObjRefBody::Handler(_) => objref_flags::OBJREF_HANDLER,
            ObjRefBody::Custom(_) => objref_flags::OBJREF_CUSTOM,
            ObjRefBody::Extended(_) => objref_flags::OBJREF_EXTENDED,
        }
    }

    /// STDOBJREF of every variant but the custom one.
    pub fn std_obj_ref(&self) -> Option<&StdObjRef> {
        match &self.body {
            ObjRefBody::Standard(s) => Some(&s.std),
            ObjRefBody::Handler(h) => Some(&h.std),
            ObjRefBody::Extended(e) => Some(&e.std),
            ObjRefBody::Custom(_) => None,
        }
    }

    pub fn ipid(&self) -> Option<Ipid> {
        self.std_obj_ref().map(|std| std.ipid)
    }

    pub fn resolver_addr(&self) -> Option<&DualStringArray> {
        match &self.body {
            ObjRefBody::Standard(s) => Some(&s.resolver_addr),
            ObjRefBody::Handler(h) => Some(&h.resolver_addr),
            ObjRefBody::Extended(e) => Some(&e.resolver_addr),
            ObjRefBody::Custom(_) => None,
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(OBJREF_SIGNATURE);
        buf.put_u32_le(self.flags());
        put_uuid(buf, &self.iid);
        match &self.body {
            ObjRefBody::Standard(s) => {
                put_std(buf, &s.std);
                put_dsa(buf, &s.resolver_addr);
            }
            ObjRefBody::Handler(h) => {
                put_std(buf, &h.std);
                put_uuid(buf, &h.clsid);
                put_dsa(buf, &h.resolver_addr);
            }
            ObjRefBody::Custom(c) => {
                put_uuid(buf, &c.clsid);
                buf.put_u32_le(c.cb_extension);
                buf.put_u32_le(c.data.len() as u32);
                buf.put_slice(&c.data);
            }
            ObjRefBody::Extended(e) => {
                put_std(buf, &e.std);
                buf.put_u32_le(ObjRefExtended::SIGNATURE);
                put_dsa(buf, &e.resolver_addr);
                buf.put_u32_le(e.elements.len() as u32);
                buf.put_u32_le(ObjRefExtended::SIGNATURE);
                for elm in &e.elements {
                    let rounded = (elm.data.len() + 7) & !7;
                    put_uuid(buf, &elm.data_id);
                    buf.put_u32_le(elm.data.len() as u32);
                    buf.put_u32_le(rounded as u32);
                    buf.put_slice(&elm.data);
                    buf.put_bytes(0, rounded - elm.data.len());
                }
            }
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(128);
        self.encode(&mut buf);
        buf.freeze()
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        need(buf, 8, "OBJREF header")?;
        let signature = buf.get_u32_le();
        if signature != OBJREF_SIGNATURE {
            return Err(DcomError::InvalidObjRef(format!(
                "invalid signature: expected 0x{:08x}, got 0x{:08x}",
                OBJREF_SIGNATURE, signature
            )));
        }
        let flags = buf.get_u32_le();
        let iid = get_uuid(buf, "IID")?;

        let body = match flags {
            objref_flags::OBJREF_STANDARD => ObjRefBody::Standard(ObjRefStandard {
                std: get_std(buf)?,
                resolver_addr: get_dsa(buf)?,
            }),
            objref_flags::OBJREF_HANDLER => ObjRefBody::Handler(ObjRefHandler {
                std: get_std(buf)?,
                clsid: get_uuid(buf, "handler CLSID")?,
                resolver_addr: get_dsa(buf)?,
            }),
            objref_flags::OBJREF_CUSTOM => {
                let clsid = get_uuid(buf, "unmarshaler CLSID")?;
                need(buf, 8, "OBJREF_CUSTOM")?;
                let cb_extension = buf.get_u32_le();
                let _size = buf.get_u32_le();
                let data = buf.copy_to_bytes(buf.remaining());
                ObjRefBody::Custom(ObjRefCustom {
                    clsid,
                    cb_extension,
                    data,
                })
            }
            objref_flags::OBJREF_EXTENDED => {
                let std = get_std(buf)?;
                need(buf, 4, "OBJREF_EXTENDED")?;
                let _signature1 = buf.get_u32_le();
                let resolver_addr = get_dsa(buf)?;
                need(buf, 8, "OBJREF_EXTENDED")?;
                let count = buf.get_u32_le() as usize;
                let _signature2 = buf.get_u32_le();
                need(buf, count.saturating_mul(24), "data elements")?;
                let mut elements = Vec::with_capacity(count);
                for _ in 0..count {
                    let data_id = get_uuid(buf, "data element")?;
                    need(buf, 8, "data element")?;
                    let size = buf.get_u32_le() as usize;
                    let rounded = buf.get_u32_le() as usize;
                    if size > rounded {
                        return Err(DcomError::InvalidObjRef(format!(
                            "data element size {} exceeds rounded size {}",
                            size, rounded
                        )));
                    }
                    need(buf, rounded, "data element")?;
                    let mut raw = buf.copy_to_bytes(rounded);
                    raw.truncate(size);
                    elements.push(DataElement { data_id, data: raw });
                }
                ObjRefBody::Extended(ObjRefExtended {
                    std,
                    resolver_addr,
                    elements,
                })
            }
            other => {
                return Err(DcomError::InvalidObjRef(format!("unknown flags 0x{:08x}", other)));
            }
        };

        Ok(Self { iid, body })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        Self::decode(&mut buf)
    }
}
