//! IRemUnknown (MS-DCOM 3.1.1.5.6)
//!
//! Remote counterpart of IUnknown, served by every object exporter:
//! - RemQueryInterface: ask an object for more interfaces
//! - RemAddRef / RemRelease: adjust remote reference counts

mod client;
mod protocol;
mod server;

pub use client::*;
pub use protocol::*;
pub use server::*;
