//! DCOM error types

use super::HResult;
use std::any::Any;
use thiserror::Error;

/// Result type for DCOM operations
pub type Result<T> = std::result::Result<T, DcomError>;

/// DCOM-specific errors
#[derive(Error, Debug)]
pub enum DcomError {
    /// Underlying DCE RPC error
    #[error("DCE RPC error: {0}")]
    Rpc(#[from] dcerpc::RpcError),

    #[error("NDR error: {0}")]
    Ndr(#[from] midl_ndr::NdrError),

    /// The RPC carrying `op` failed before a return code arrived
    #[error("{op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: dcerpc::RpcError,
    },

    /// A call completed but returned a failing HRESULT or status
    ///
    /// `response` keeps the decoded `[out]` parameters; some methods report
    /// useful data alongside a failure, such as a required buffer size.
    #[error("{op}: {hresult}")]
    Call {
        op: &'static str,
        hresult: HResult,
        response: Option<Box<dyn Any + Send + Sync>>,
    },

    /// An ORPC call had no interface pointer to address
    #[error("{op}: ipid is missing")]
    IpidMissing { op: &'static str },

    /// Invalid OBJREF format
    #[error("invalid OBJREF: {0}")]
    InvalidObjRef(String),

    /// Invalid string binding format
    #[error("invalid string binding: {0}")]
    InvalidStringBinding(String),

    /// The peer returned no object where one was required
    #[error("{op}: no object returned")]
    NullObject { op: &'static str },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl DcomError {
    /// HRESULT carried by a failed call, if any.
    pub fn hresult(&self) -> Option<HResult> {
        match self {
            DcomError::Call { hresult, .. } => Some(*hresult),
            DcomError::Rpc(dcerpc::RpcError::Fault(status))
            | DcomError::Transport {
                source: dcerpc::RpcError::Fault(status),
                ..
            } => Some(HResult::from_status(*status)),
            _ => None,
        }
    }

    /// Attach the decoded response to a [`DcomError::Call`].
    pub fn with_response<T: Any + Send + Sync>(self, resp: T) -> Self {
        match self {
            DcomError::Call { op, hresult, .. } => DcomError::Call {
                op,
                hresult,
                response: Some(Box::new(resp)),
            },
            other => other,
        }
    }

    /// The response a failed call returned, if it decoded as `T`.
    pub fn response<T: Any>(&self) -> Option<&T> {
        match self {
            DcomError::Call {
                response: Some(resp),
                ..
            } => resp.downcast_ref(),
            _ => None,
        }
    }
}

/// Wrap a non-zero return code of `op` into [`DcomError::Call`].
///
/// Every client stub funnels its `Return` field through here, so the
/// error text always names the operation that failed.
pub fn call_error(op: &'static str, code: u32) -> DcomError {
    DcomError::Call {
        op,
        hresult: HResult::from_status(code),
        response: None,
    }
}

/// Attach the operation name to a transport or NDR failure.
pub fn transport_error(op: &'static str, source: dcerpc::RpcError) -> DcomError {
    DcomError::Transport { op, source }
}

/// `Ok(())` for a zero return code, otherwise [`call_error`].
pub fn check_return(op: &'static str, code: u32) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(call_error(op, code))
    }
}
