//! IDispatch (MS-OAUT 3.1.4), the automation base of scriptable interfaces

mod client;
mod protocol;
mod server;

pub use client::*;
pub use protocol::*;
pub use server::*;
