//! IDispatch server dispatch

use super::protocol::*;
use async_trait::async_trait;
use bytes::Bytes;
use dcom::types::Ipid;
use dcom::{unknown_server_handle, UnknownServer, IUNKNOWN_OPNUM_COUNT};
use dcerpc::{marshal, Call, DceRpcServer, RpcError, ServerHandle};
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait DispatchServer: UnknownServer {
    async fn get_type_info_count(&self, _req: GetTypeInfoCountRequest) -> dcerpc::Result<GetTypeInfoCountResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn get_type_info(&self, _req: GetTypeInfoRequest) -> dcerpc::Result<GetTypeInfoResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn get_ids_of_names(&self, _req: GetIdsOfNamesRequest) -> dcerpc::Result<GetIdsOfNamesResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn invoke(&self, _req: InvokeRequest) -> dcerpc::Result<InvokeResponse> {
        Err(RpcError::NotImplemented)
    }
}

pub async fn dispatch_server_handle<S: DispatchServer + ?Sized>(server: &S, call: Call) -> dcerpc::Result<Bytes> {
    if call.opnum < IUNKNOWN_OPNUM_COUNT {
        return unknown_server_handle(server, call).await;
    }
    debug!(opnum = call.opnum, object = ?call.object, "IDispatch call");
    match call.opnum {
        opnum::GET_TYPE_INFO_COUNT => marshal(&server.get_type_info_count(call.decode()?).await?),
        opnum::GET_TYPE_INFO => marshal(&server.get_type_info(call.decode()?).await?),
        opnum::GET_IDS_OF_NAMES => marshal(&server.get_ids_of_names(call.decode()?).await?),
        opnum::INVOKE => marshal(&server.invoke(call.decode()?).await?),
        other => Err(RpcError::OperationUnavailable(other)),
    }
}

pub struct DispatchServerHandle<S>(pub Arc<S>);

#[async_trait]
impl<S: DispatchServer + 'static> ServerHandle for DispatchServerHandle<S> {
    async fn handle(&self, call: Call) -> dcerpc::Result<Bytes> {
        dispatch_server_handle(self.0.as_ref(), call).await
    }
}

pub async fn register_dispatch_server<S: DispatchServer + 'static>(
    rpc: &DceRpcServer,
    server: Arc<S>,
    ipid: Option<Ipid>,
) {
    rpc.register(
        DISPATCH_SYNTAX_V0_0,
        ipid.map(|ipid| ipid.uuid()),
        Arc::new(DispatchServerHandle(server)),
    )
    .await;
}
