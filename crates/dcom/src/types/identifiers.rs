//! DCOM identifier types (MS-DCOM 2.2.18)
//!
//! - OXID: object exporter identifier
//! - OID: object identifier
//! - IPID: interface pointer identifier, sent as the object UUID of a call
//! - SETID: ping set identifier
//! - CID, IID, CLSID: plain GUIDs

use dcerpc::Uuid;
use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};
use std::fmt;

/// Causality identifier
pub type Cid = Uuid;
/// Interface identifier
pub type Iid = Uuid;
/// Class identifier
pub type Clsid = Uuid;

/// Generate a new random v4 UUID
pub fn generate_uuid() -> Uuid {
    let random = uuid::Uuid::new_v4();
    let (d1, d2, d3, d4) = random.as_fields();
    Uuid::from_fields(d1, d2, d3, *d4)
}

fn random_u64() -> u64 {
    uuid::Uuid::new_v4().as_u64_pair().0
}

macro_rules! id64 {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub const SIZE: usize = 8;

            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn generate() -> Self {
                Self(random_u64())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "({:016x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl NdrEncode for $name {
            fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
                w.write_u64(self.0);
                Ok(())
            }
        }

        impl NdrDecode for $name {
            fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
                Ok(Self(r.read_u64()?))
            }
        }
    };
}

id64!(
    /// Object exporter identifier; locates the RPC bindings of an apartment.
    Oxid,
    "OXID"
);

id64!(
    /// Object identifier, unique within an object exporter.
    Oid,
    "OID"
);

id64!(
    /// Ping set identifier.
    SetId,
    "SETID"
);

/// Interface Pointer Identifier (16 bytes / UUID)
///
/// Names one interface on one object. ORPC calls carry it as the object
/// UUID of the REQUEST PDU, which is how the server finds the target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Ipid(pub Uuid);

impl Ipid {
    pub const SIZE: usize = 16;

    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn generate() -> Self {
        Self(generate_uuid())
    }

    pub fn nil() -> Self {
        Self(Uuid::NIL)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse(s).map(Self)
    }
}

impl From<Uuid> for Ipid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Ipid> for Uuid {
    fn from(ipid: Ipid) -> Self {
        ipid.0
    }
}

impl fmt::Debug for Ipid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPID({})", self.0)
    }
}

impl fmt::Display for Ipid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NdrEncode for Ipid {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.0.ndr_encode(w)
    }
}

impl NdrDecode for Ipid {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self(Uuid::ndr_decode(r)?))
    }
}
