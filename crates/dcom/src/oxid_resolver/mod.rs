//! OXID resolver: the IObjectExporter interface (MS-DCOM 3.1.2.5.1)
//!
//! Resolves object exporter identifiers to string bindings and keeps
//! exported objects alive through ping sets.

mod client;
mod protocol;
mod server;

pub use client::*;
pub use protocol::*;
pub use server::*;
