//! DCOM interface stubs built on the `dcom` runtime.
//!
//! Every interface follows one layout:
//!
//! - `protocol`: syntax and IID constants, opnums, request and response
//!   structures with their NDR encoding, and one [`dcerpc::Operation`]
//!   marker per method
//! - `client`: a client bound to the interface syntax that addresses an
//!   IPID and checks each HRESULT
//! - `server`: an async trait whose methods default to
//!   `RpcError::NotImplemented`, a dispatcher, and a registration helper
//!
//! Derived interfaces delegate the opnums of their base to the base
//! dispatcher, so a single registration serves IUnknown, IDispatch and the
//! derived methods of one object.
//!
//! ```no_run
//! use msrpc::iiss::iiisservicecontrol::{IisServiceControlClient, StatusRequest};
//! use dcerpc::{CallOptions, DceRpcClient};
//! use dcom::types::{Ipid, OrpcThis};
//! use std::sync::Arc;
//!
//! # async fn run(ipid: Ipid) -> dcom::Result<()> {
//! let rpc = Arc::new(DceRpcClient::dial("10.0.0.5:49700".parse().unwrap()).await?);
//! let iis = IisServiceControlClient::new(&rpc).await?.ipid(ipid);
//! let status = iis
//!     .status(&StatusRequest { this: OrpcThis::new(), buffer_size: 1024 }, &CallOptions::new())
//!     .await?;
//! println!("{} services", status.num_services);
//! # Ok(())
//! # }
//! ```

pub mod certview;
pub mod iiss;
pub mod oaut;
pub mod orpc;

pub use orpc::OrpcResponse;
