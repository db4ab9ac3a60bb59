//! IUnknown base of every DCOM interface
//!
//! QueryInterface, AddRef and Release occupy opnums 0-2 of every
//! interface but are never called over the wire; IRemUnknown carries
//! their remote counterparts. Derived interfaces hand those opnums down
//! here and get `OperationUnavailable` back.

use bytes::Bytes;
use dcerpc::{Call, RpcError};

/// 00000000-0000-0000-c000-000000000046
pub use crate::types::iid::IUNKNOWN as IUNKNOWN_IID;

/// Number of opnums IUnknown occupies.
pub const IUNKNOWN_OPNUM_COUNT: u16 = 3;

/// Server side of IUnknown; it has no remotable methods.
pub trait UnknownServer: Send + Sync {}

/// Base dispatch for opnums below a derived interface's first method.
pub async fn unknown_server_handle<S: UnknownServer + ?Sized>(_server: &S, call: Call) -> dcerpc::Result<Bytes> {
    Err(RpcError::OperationUnavailable(call.opnum))
}
