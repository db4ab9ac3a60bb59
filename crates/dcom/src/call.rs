//! Client-side call helpers shared by every interface stub
//!
//! [`call`] runs one operation and turns transport failures and non-zero
//! return codes into [`DcomError`]s that name the operation.
//! [`invoke_orpc`] additionally addresses the call to an interface pointer.

use crate::types::{call_error, transport_error, DcomError, Ipid, Result};
use dcerpc::{CallOptions, Conn, Operation};
use tracing::debug;

/// A response carrying a `Return` value (HRESULT or `error_status_t`).
pub trait ReturnCode {
    fn return_code(&self) -> u32;
}

/// Pick the IPID for an ORPC call.
///
/// An object set in the call options wins over the client's own IPID; a
/// call with neither fails before anything is sent.
pub fn resolve_ipid(op: &'static str, opts: &CallOptions, default_ipid: Option<Ipid>) -> Result<Ipid> {
    opts.object
        .map(Ipid)
        .or(default_ipid)
        .filter(|ipid| !ipid.is_nil())
        .ok_or(DcomError::IpidMissing { op })
}

/// Invoke `O`, then check its return code.
///
/// A failing return code still hands back the decoded response through
/// [`DcomError::response`].
pub async fn call<O>(conn: &dyn Conn, req: &O::Request, opts: &CallOptions) -> Result<O::Response>
where
    O: Operation,
    O::Response: ReturnCode + 'static,
{
    let resp = dcerpc::invoke::<O>(conn, req, opts)
        .await
        .map_err(|e| transport_error(O::NAME, e))?;
    match resp.return_code() {
        0 => Ok(resp),
        code => Err(call_error(O::NAME, code).with_response(resp)),
    }
}

/// Invoke the ORPC operation `O` on an interface pointer.
pub async fn invoke_orpc<O>(
    conn: &dyn Conn,
    default_ipid: Option<Ipid>,
    req: &O::Request,
    opts: &CallOptions,
) -> Result<O::Response>
where
    O: Operation,
    O::Response: ReturnCode + 'static,
{
    let ipid = resolve_ipid(O::NAME, opts, default_ipid)?;
    debug!(op = O::NAME, %ipid, "orpc call");
    let opts = opts.clone().with_object(ipid.uuid());
    call::<O>(conn, req, &opts).await
}
