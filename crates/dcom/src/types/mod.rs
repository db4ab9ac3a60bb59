//! Core DCOM types (MS-DCOM 2.2)
//!
//! - Identifiers: OXID, OID, IPID, SETID
//! - Object references: OBJREF and its variants, MInterfacePointer
//! - String bindings: DUALSTRINGARRAY
//! - ORPC headers: ORPCTHIS, ORPCTHAT
//! - HRESULT values and the DCOM error type

mod error;
pub mod hresult;
mod identifiers;
mod interface_pointer;
mod objref;
mod orpc;
mod stdobjref;
mod stringbinding;

pub use error::{call_error, check_return, transport_error, DcomError, Result};
pub use hresult::HResult;
pub use identifiers::{generate_uuid, Cid, Clsid, Iid, Ipid, Oid, Oxid, SetId};
pub use interface_pointer::MInterfacePointer;
pub use objref::{
    objref_flags, DataElement, ObjRef, ObjRefBody, ObjRefCustom, ObjRefExtended, ObjRefHandler,
    ObjRefStandard, OBJREF_SIGNATURE,
};
pub use orpc::{extent_id, ComVersion, OrpcExtent, OrpcExtentArray, OrpcThat, OrpcThis};
pub use stdobjref::{flags as sorf_flags, StdObjRef};
pub use stringbinding::{
    authn_svc, protocol_id, DualStringArray, SecurityBinding, StringBinding, AUTHZ_NONE,
};

/// Well-known interface identifiers
pub mod iid {
    use dcerpc::Uuid;

    const COM_TAIL: [u8; 8] = [0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46];

    /// 00000000-0000-0000-c000-000000000046
    pub const IUNKNOWN: Uuid = Uuid::from_fields(0x0000_0000, 0, 0, COM_TAIL);
    /// 00000131-0000-0000-c000-000000000046
    pub const IREMUNKNOWN: Uuid = Uuid::from_fields(0x0000_0131, 0, 0, COM_TAIL);
    /// 00000143-0000-0000-c000-000000000046
    pub const IREMUNKNOWN2: Uuid = Uuid::from_fields(0x0000_0143, 0, 0, COM_TAIL);
    /// 00020400-0000-0000-c000-000000000046
    pub const IDISPATCH: Uuid = Uuid::from_fields(0x0002_0400, 0, 0, COM_TAIL);
    /// 99fcfec4-5260-101b-bbcb-00aa0021347a
    pub const IOBJECTEXPORTER: Uuid =
        Uuid::from_fields(0x99fc_fec4, 0x5260, 0x101b, [0xbb, 0xcb, 0x00, 0xaa, 0x00, 0x21, 0x34, 0x7a]);
}

/// Well-known CLSID values
pub mod clsid {
    use dcerpc::Uuid;

    /// Standard marshaler, 00000017-0000-0000-c000-000000000046
    pub const STD_MARSHAL: Uuid =
        Uuid::from_fields(0x0000_0017, 0, 0, [0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_ids() {
        assert_eq!(iid::IUNKNOWN.to_string(), "00000000-0000-0000-c000-000000000046");
        assert_eq!(iid::IDISPATCH.to_string(), "00020400-0000-0000-c000-000000000046");
        assert_eq!(iid::IOBJECTEXPORTER.to_string(), "99fcfec4-5260-101b-bbcb-00aa0021347a");
        assert_eq!(clsid::STD_MARSHAL.to_string(), "00000017-0000-0000-c000-000000000046");
    }
}
