//! Error types for DCE RPC

use thiserror::Error;

/// RPC error types
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NDR error: {0}")]
    Ndr(#[from] midl_ndr::NdrError),

    #[error("RPC version mismatch: {0}")]
    RpcVersionMismatch(u32),

    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("operation unavailable: {0}")]
    OperationUnavailable(u16),

    /// Returned by server stubs whose operation has no implementation.
    #[error("not implemented")]
    NotImplemented,

    #[error("invalid PDU: {0}")]
    InvalidPduData(String),

    #[error("invalid message type: {0}")]
    InvalidMessageType(i32),

    #[error("call rejected: {0}")]
    CallRejected(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,

    #[error("bind failed: {0}")]
    BindFailed(String),

    /// The server refused a presentation context.
    #[error("bind rejected: result {result}, reason {reason}")]
    BindRejected { result: u16, reason: u16 },

    #[error("fault: status 0x{0:08x}")]
    Fault(u32),

    #[error("context mismatch: presentation context {0} is not bound")]
    ContextMismatch(u16),

    #[error("XID mismatch: expected {expected}, got {got}")]
    XidMismatch { expected: u32, got: u32 },

    #[error("record too large: {size} bytes exceeds maximum {max}")]
    RecordTooLarge { size: usize, max: usize },

    #[error("fragment assembly failed: {0}")]
    FragmentAssemblyError(String),

    #[error("fragment out of order: expected first fragment for call {0}")]
    FragmentOutOfOrder(u32),

    #[error("invalid string binding {0}")]
    InvalidBinding(String),
}

impl RpcError {
    pub(crate) fn short_pdu(what: &str) -> Self {
        RpcError::InvalidPduData(format!("{} truncated", what))
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
