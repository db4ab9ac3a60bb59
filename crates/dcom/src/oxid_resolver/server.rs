//! IObjectExporter server dispatch

use super::protocol::*;
use async_trait::async_trait;
use bytes::Bytes;
use dcerpc::{marshal, Call, DceRpcServer, RpcError, ServerHandle};
use std::sync::Arc;
use tracing::debug;

/// Server side of IObjectExporter. Unimplemented methods fault with
/// `RpcError::NotImplemented`.
#[async_trait]
pub trait ObjectExporterServer: Send + Sync {
    async fn resolve_oxid(&self, _req: ResolveOxidRequest) -> dcerpc::Result<ResolveOxidResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn simple_ping(&self, _req: SimplePingRequest) -> dcerpc::Result<StatusResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn complex_ping(&self, _req: ComplexPingRequest) -> dcerpc::Result<ComplexPingResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn server_alive(&self) -> dcerpc::Result<StatusResponse> {
        Ok(StatusResponse::default())
    }

    async fn resolve_oxid2(&self, _req: ResolveOxidRequest) -> dcerpc::Result<ResolveOxid2Response> {
        Err(RpcError::NotImplemented)
    }

    async fn server_alive2(&self) -> dcerpc::Result<ServerAlive2Response> {
        Err(RpcError::NotImplemented)
    }
}

pub async fn object_exporter_server_handle<S: ObjectExporterServer + ?Sized>(
    server: &S,
    call: Call,
) -> dcerpc::Result<Bytes> {
    debug!(opnum = call.opnum, "IObjectExporter call");
    match call.opnum {
        opnum::RESOLVE_OXID => marshal(&server.resolve_oxid(call.decode()?).await?),
        opnum::SIMPLE_PING => marshal(&server.simple_ping(call.decode()?).await?),
        opnum::COMPLEX_PING => marshal(&server.complex_ping(call.decode()?).await?),
        opnum::SERVER_ALIVE => marshal(&server.server_alive().await?),
        opnum::RESOLVE_OXID2 => marshal(&server.resolve_oxid2(call.decode()?).await?),
        opnum::SERVER_ALIVE2 => marshal(&server.server_alive2().await?),
        other => Err(RpcError::OperationUnavailable(other)),
    }
}

pub struct ObjectExporterServerHandle<S>(pub Arc<S>);

#[async_trait]
impl<S: ObjectExporterServer + 'static> ServerHandle for ObjectExporterServerHandle<S> {
    async fn handle(&self, call: Call) -> dcerpc::Result<Bytes> {
        object_exporter_server_handle(self.0.as_ref(), call).await
    }
}

/// Serve IObjectExporter for all objects on `rpc`.
pub async fn register_object_exporter_server<S: ObjectExporterServer + 'static>(rpc: &DceRpcServer, server: Arc<S>) {
    rpc.register(
        OBJECT_EXPORTER_SYNTAX_V0_0,
        None,
        Arc::new(ObjectExporterServerHandle(server)),
    )
    .await;
}
