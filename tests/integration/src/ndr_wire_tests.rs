//! Wire layout checks across the crate boundaries: ORPC headers, interface
//! pointers inside VARIANTs, resolver bindings and malformed stubs.

mod common;

use bytes::Bytes;
use common::*;
use dcerpc::{marshal, unmarshal, RpcError};
use dcom::oxid_resolver::{ComplexPingRequest, ResolveOxid2Response};
use dcom::types::{iid, ComVersion, DualStringArray, Ipid, MInterfacePointer, ObjRef, Oid, Oxid, SetId};
use dcom::OrpcThis;
use midl_ndr::{NdrError, UniquePtr};
use msrpc::certview::icertview::SetRestrictionRequest;
use msrpc::oaut::idispatch::InvokeRequest;
use msrpc::oaut::{dispatch_flags, DispParams, Variant};

#[test]
fn test_orpcthis_header_layout() {
    let this = OrpcThis::new();
    let bytes = marshal(&this).unwrap();
    assert_eq!(bytes.len(), 32);
    // COMVERSION 5.7, flags, reserved
    assert_eq!(&bytes[..12], &[5, 0, 7, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    // no extensions
    assert_eq!(&bytes[28..], &[0, 0, 0, 0]);

    let decoded: OrpcThis = unmarshal(bytes).unwrap();
    assert_eq!(decoded.cid, this.cid);
}

#[test]
fn test_restriction_with_string_value() {
    let req = SetRestrictionRequest {
        this: OrpcThis::new(),
        column_index: 2,
        seek_operator: msrpc::certview::seek::EQ,
        sort_order: msrpc::certview::sort::ASCEND,
        value: UniquePtr::new(Variant::bstr("0a1b2c3d")),
    };
    let decoded: SetRestrictionRequest = unmarshal(marshal(&req).unwrap()).unwrap();
    assert_eq!(decoded, req);
}

#[test]
fn test_interface_pointer_inside_variant() {
    let ipid = Ipid::generate();
    let objref = ObjRef::local(iid::IDISPATCH, Oxid(0x1122), Oid(0x3344), ipid);
    let req = InvokeRequest {
        this: OrpcThis::new(),
        disp_id_member: 7,
        flags: dispatch_flags::PROPERTYPUTREF,
        disp_params: DispParams::property_put(Variant::Dispatch(UniquePtr::new(
            MInterfacePointer::from_objref(&objref),
        ))),
        ..Default::default()
    };

    let decoded: InvokeRequest = unmarshal(marshal(&req).unwrap()).unwrap();
    let arg = decoded.disp_params.args[0].as_ref().unwrap();
    let Variant::Dispatch(ptr) = arg else {
        panic!("expected VT_DISPATCH, got {:?}", arg.var_type());
    };
    let back = ptr.as_ref().unwrap().objref().unwrap();
    assert_eq!(back.ipid(), Some(ipid));
    assert_eq!(back.iid, iid::IDISPATCH);
}

#[test]
fn test_resolver_bindings() {
    let resp = ResolveOxid2Response {
        oxid_bindings: UniquePtr::new(DualStringArray::with_tcp_binding("10.1.2.3[49720]")),
        rem_unknown: Ipid::generate(),
        authn_hint: 1,
        com_version: ComVersion::DCOM_5_7,
        ret: 0,
    };
    let decoded: ResolveOxid2Response = unmarshal(marshal(&resp).unwrap()).unwrap();
    let bindings = decoded.oxid_bindings.as_ref().unwrap();
    assert_eq!(bindings.tcp_address(), Some("10.1.2.3[49720]"));
    assert_eq!(decoded.rem_unknown, resp.rem_unknown);
}

#[test]
fn test_complex_ping_sets() {
    let req = ComplexPingRequest {
        set_id: SetId(0),
        sequence_num: 1,
        add_to_set: Some(vec![Oid(1), Oid(2), Oid(3)]),
        del_from_set: None,
    };
    let decoded: ComplexPingRequest = unmarshal(marshal(&req).unwrap()).unwrap();
    assert_eq!(decoded.add_to_set.as_deref(), Some(&[Oid(1), Oid(2), Oid(3)][..]));
    assert!(decoded.del_from_set.is_none());
}

#[test]
fn test_truncated_stub() {
    let req = SetRestrictionRequest {
        this: OrpcThis::new(),
        value: UniquePtr::new(Variant::bstr("truncated")),
        ..Default::default()
    };
    let bytes = marshal(&req).unwrap();
    let cut = bytes.slice(..bytes.len() - 6);
    let err = unmarshal::<SetRestrictionRequest>(cut).unwrap_err();
    assert!(matches!(err, RpcError::Ndr(_)), "unexpected error {err:?}");
}

#[test]
fn test_hostile_count_rejected_before_allocating() {
    // rgvarg present, cArgs of four billion
    let mut stub = marshal(&OrpcThis::new()).unwrap().to_vec();
    stub.extend_from_slice(&7i32.to_le_bytes());
    stub.extend_from_slice(&[0; 16]);
    stub.extend_from_slice(&0u32.to_le_bytes());
    stub.extend_from_slice(&dispatch_flags::METHOD.to_le_bytes());
    stub.extend_from_slice(&[1, 0, 2, 0, 0, 0, 0, 0]);
    stub.extend_from_slice(&u32::MAX.to_le_bytes());
    stub.extend_from_slice(&0u32.to_le_bytes());

    let mut data = TestDataGenerator::new(3);
    stub.extend_from_slice(&data.random_bytes(64));
    let err = unmarshal::<InvokeRequest>(Bytes::from(stub)).unwrap_err();
    assert!(
        matches!(err, RpcError::Ndr(NdrError::AllocationLimitExceeded { .. })),
        "unexpected error {err:?}"
    );
}
