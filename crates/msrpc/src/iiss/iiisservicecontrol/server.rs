//! IIisServiceControl server dispatch

use super::protocol::*;
use crate::oaut::idispatch::{dispatch_server_handle, DispatchServer, DISPATCH_OPNUM_COUNT};
use async_trait::async_trait;
use bytes::Bytes;
use dcom::types::Ipid;
use dcerpc::{marshal, Call, DceRpcServer, RpcError, ServerHandle};
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait IisServiceControlServer: DispatchServer {
    async fn stop(&self, _req: StopRequest) -> dcerpc::Result<StopResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn start(&self, _req: StartRequest) -> dcerpc::Result<StartResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn reboot(&self, _req: RebootRequest) -> dcerpc::Result<RebootResponse> {
        Err(RpcError::NotImplemented)
    }

    /// Return every status record; the dispatcher pads the buffer to the
    /// caller's size, or fails the call with `ERROR_INSUFFICIENT_BUFFER`
    /// when the records do not fit.
    async fn status(&self, _req: StatusRequest) -> dcerpc::Result<StatusResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn kill(&self, _req: KillRequest) -> dcerpc::Result<KillResponse> {
        Err(RpcError::NotImplemented)
    }
}

pub async fn iis_service_control_server_handle<S: IisServiceControlServer + ?Sized>(
    server: &S,
    call: Call,
) -> dcerpc::Result<Bytes> {
    if call.opnum < DISPATCH_OPNUM_COUNT {
        return dispatch_server_handle(server, call).await;
    }
    debug!(opnum = call.opnum, object = ?call.object, "IIisServiceControl call");
    match call.opnum {
        opnum::STOP => marshal(&server.stop(call.decode()?).await?),
        opnum::START => marshal(&server.start(call.decode()?).await?),
        opnum::REBOOT => marshal(&server.reboot(call.decode()?).await?),
        opnum::STATUS => {
            let req: StatusRequest = call.decode()?;
            let size = req.buffer_size as usize;
            let mut resp = server.status(req).await?;
            if !resp.fit_to_request(size) {
                warn!(required = resp.required_buffer_size, size, "status buffer too small");
            }
            marshal(&resp)
        }
        opnum::KILL => marshal(&server.kill(call.decode()?).await?),
        other => Err(RpcError::OperationUnavailable(other)),
    }
}

pub struct IisServiceControlServerHandle<S>(pub Arc<S>);

#[async_trait]
impl<S: IisServiceControlServer + 'static> ServerHandle for IisServiceControlServerHandle<S> {
    async fn handle(&self, call: Call) -> dcerpc::Result<Bytes> {
        iis_service_control_server_handle(self.0.as_ref(), call).await
    }
}

pub async fn register_iis_service_control_server<S: IisServiceControlServer + 'static>(
    rpc: &DceRpcServer,
    server: Arc<S>,
    ipid: Option<Ipid>,
) {
    rpc.register(
        IIS_SERVICE_CONTROL_SYNTAX_V0_0,
        ipid.map(|ipid| ipid.uuid()),
        Arc::new(IisServiceControlServerHandle(server)),
    )
    .await;
}
