//! DCOM object RPC layer on top of DCE RPC (MS-DCOM)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              interface stubs (msrpc crate)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ORPC call helper     │  IRemUnknown      │ IObjectExporter │
//! │  - IPID addressing    │  (per exporter)   │ (port 135)      │
//! │  - HRESULT mapping    │                   │                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  types: ORPCTHIS/THAT, OBJREF, DUALSTRINGARRAY, HRESULT     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  DCE RPC Layer (dcerpc crate)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **OXID**: Object Exporter ID, identifies an apartment/process
//! - **OID**: Object ID, identifies an object within an exporter
//! - **IPID**: Interface Pointer ID, identifies an interface on an object;
//!   ORPC calls carry it as the object UUID of the request
//!
//! # Modules
//!
//! - [`types`]: Core DCOM data types
//! - [`call`]: client-side invocation and return code checking
//! - [`iunknown`]: IUnknown base dispatch
//! - [`remunknown`]: IRemUnknown (remote reference counting)
//! - [`oxid_resolver`]: IObjectExporter (OXID resolution, pinging)

pub mod call;
pub mod iunknown;
pub mod oxid_resolver;
pub mod remunknown;
pub mod types;

pub use call::{call, invoke_orpc, resolve_ipid, ReturnCode};
pub use iunknown::{unknown_server_handle, UnknownServer, IUNKNOWN_IID, IUNKNOWN_OPNUM_COUNT};
pub use types::{
    call_error, ComVersion, DcomError, DualStringArray, HResult, Ipid, MInterfacePointer, ObjRef,
    Oid, OrpcThat, OrpcThis, Oxid, Result, SetId, StdObjRef, StringBinding,
};

/// DCOM version sent in every ORPCTHIS
pub const DCOM_VERSION: ComVersion = ComVersion::DCOM_5_7;

