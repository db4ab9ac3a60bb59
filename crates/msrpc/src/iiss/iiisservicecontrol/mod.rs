//! IIisServiceControl: stop, start, reboot and query the IIS services of a host

mod client;
mod protocol;
mod server;

pub use client::*;
pub use protocol::*;
pub use server::*;
