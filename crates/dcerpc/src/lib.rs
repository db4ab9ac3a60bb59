//! DCE RPC (MS-RPC) connection-oriented client and server runtime
//!
//! This crate carries NDR-encoded stubs between interface bindings over TCP,
//! as specified in DCE 1.1 RPC (C706) and MS-RPCE.
//!
//! # Features
//!
//! - Connection-oriented PDUs with multi-context BIND / ALTER_CONTEXT
//! - Request and response fragmentation
//! - Object UUIDs in requests, used by DCOM to address an IPID
//! - A typed [`Operation`] layer for generated-style interface stubs
//! - Async server and client using Tokio
//!
//! # Example
//!
//! ## TCP Server
//!
//! ```no_run
//! use dcerpc::{DceRpcServer, InterfaceBuilder};
//! use bytes::Bytes;
//!
//! #[tokio::main]
//! async fn main() {
//!     let interface = InterfaceBuilder::new(
//!         "12345678-1234-1234-1234-123456789012",
//!         1,
//!         0,
//!     )
//!     .unwrap()
//!     .operation(0, |args: Bytes| async move { Ok(args) })
//!     .build();
//!
//!     let server = DceRpcServer::new();
//!     server.register_interface(interface).await;
//!     server.run("127.0.0.1:12345".parse().unwrap()).await.unwrap();
//! }
//! ```
//!
//! ## TCP Client
//!
//! ```no_run
//! use dcerpc::{DceRpcClient, SyntaxId, Uuid};
//! use bytes::Bytes;
//!
//! #[tokio::main]
//! async fn main() {
//!     let interface = SyntaxId::new(
//!         Uuid::parse("12345678-1234-1234-1234-123456789012").unwrap(),
//!         1,
//!         0,
//!     );
//!
//!     let client = DceRpcClient::connect(
//!         "127.0.0.1:12345".parse().unwrap(),
//!         interface,
//!     ).await.unwrap();
//!
//!     let result = client.call(0, Bytes::from("hello")).await.unwrap();
//!     assert_eq!(result.as_ref(), b"hello");
//! }
//! ```

pub mod error;

pub mod binding;
pub mod dcerpc;
pub mod dcerpc_client;
pub mod dcerpc_server;
pub mod dcerpc_transport;
pub mod fragmentation;
pub mod operation;

pub use error::{Result, RpcError};

pub use binding::{ProtocolSequence, StringBinding};
pub use dcerpc::{
    reject_reason, AlterContextPdu, AlterContextRespPdu, BindAckPdu, BindNakPdu, BindPdu, CharRep,
    ContextElement, ContextResult, DataRepresentation, FaultPdu, FaultStatus, FloatRep, IntRep,
    PacketFlags, PacketType, Pdu, PduHeader, PresentationResult, RequestPdu, ResponsePdu, SyntaxId,
    Uuid, DCE_RPC_VERSION, DCE_RPC_VERSION_MINOR, DEFAULT_MAX_FRAG, MUST_RECV_FRAG_SIZE, NDR_SYNTAX,
    NDR_SYNTAX_UUID, NDR_SYNTAX_VERSION,
};
pub use dcerpc_client::{BoundConn, DceRpcClient, DceRpcClientBuilder};
pub use dcerpc_server::{
    fault_status, Call, DEFAULT_MAX_PENDING_CALLS, DceRpcServer, DceRpcServerConfig, Interface, InterfaceBuilder,
    OperationHandler, ServerHandle, ServerStats, ServerStatsSnapshot,
};
pub use dcerpc_transport::{DceRpcTransport, DEFAULT_MAX_PDU_SIZE};
pub use fragmentation::{FragmentAssembler, FragmentGenerator};
pub use operation::{invoke, marshal, unmarshal, unmarshal_with, CallOptions, Conn, Operation, Reply};
