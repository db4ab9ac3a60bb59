//! IRemUnknown server dispatch

use super::protocol::*;
use crate::iunknown::{unknown_server_handle, UnknownServer, IUNKNOWN_OPNUM_COUNT};
use crate::types::Ipid;
use async_trait::async_trait;
use bytes::Bytes;
use dcerpc::{marshal, Call, DceRpcServer, RpcError, ServerHandle};
use std::sync::Arc;
use tracing::debug;

/// Server side of IRemUnknown.
///
/// Methods left unimplemented answer with `RpcError::NotImplemented`,
/// which the runtime turns into a fault.
#[async_trait]
pub trait RemUnknownServer: UnknownServer {
    async fn rem_query_interface(
        &self,
        _req: RemQueryInterfaceRequest,
    ) -> dcerpc::Result<RemQueryInterfaceResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn rem_add_ref(&self, _req: RemAddRefRequest) -> dcerpc::Result<RemAddRefResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn rem_release(&self, _req: RemReleaseRequest) -> dcerpc::Result<RemReleaseResponse> {
        Err(RpcError::NotImplemented)
    }
}

/// Decode a call, run the matching method and marshal its response.
pub async fn rem_unknown_server_handle<S: RemUnknownServer + ?Sized>(
    server: &S,
    call: Call,
) -> dcerpc::Result<Bytes> {
    if call.opnum < IUNKNOWN_OPNUM_COUNT {
        return unknown_server_handle(server, call).await;
    }
    debug!(opnum = call.opnum, object = ?call.object, "IRemUnknown call");
    match call.opnum {
        opnum::REM_QUERY_INTERFACE => marshal(&server.rem_query_interface(call.decode()?).await?),
        opnum::REM_ADD_REF => marshal(&server.rem_add_ref(call.decode()?).await?),
        opnum::REM_RELEASE => marshal(&server.rem_release(call.decode()?).await?),
        other => Err(RpcError::OperationUnavailable(other)),
    }
}

/// Adapter registering a [`RemUnknownServer`] with the RPC runtime.
pub struct RemUnknownServerHandle<S>(pub Arc<S>);

#[async_trait]
impl<S: RemUnknownServer + 'static> ServerHandle for RemUnknownServerHandle<S> {
    async fn handle(&self, call: Call) -> dcerpc::Result<Bytes> {
        rem_unknown_server_handle(self.0.as_ref(), call).await
    }
}

/// Serve IRemUnknown, for one IPID when `ipid` is set.
pub async fn register_rem_unknown_server<S: RemUnknownServer + 'static>(
    rpc: &DceRpcServer,
    server: Arc<S>,
    ipid: Option<Ipid>,
) {
    rpc.register(
        REMUNKNOWN_SYNTAX_V0_0,
        ipid.map(|ipid| ipid.uuid()),
        Arc::new(RemUnknownServerHandle(server)),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remunknown::RemUnknownClient;
    use crate::types::{hresult, DcomError, HResult, OrpcThat, OrpcThis};
    use dcerpc::{CallOptions, Conn};
    use midl_ndr::ConformantArray;
    use parking_lot::Mutex;

    /// Answers RemRelease only and remembers what it released.
    #[derive(Default)]
    struct Releaser {
        released: Mutex<Vec<RemInterfaceRef>>,
    }

    impl UnknownServer for Releaser {}

    #[async_trait]
    impl RemUnknownServer for Releaser {
        async fn rem_release(&self, req: RemReleaseRequest) -> dcerpc::Result<RemReleaseResponse> {
            self.released.lock().extend(req.refs);
            Ok(RemReleaseResponse {
                that: OrpcThat::new(),
                ret: HResult::OK,
            })
        }

        async fn rem_query_interface(
            &self,
            req: RemQueryInterfaceRequest,
        ) -> dcerpc::Result<RemQueryInterfaceResponse> {
            let results = req
                .iids
                .iter()
                .map(|_| RemQiResult::failed(HResult::from_status(hresult::E_NOINTERFACE)))
                .collect();
            Ok(RemQueryInterfaceResponse {
                that: OrpcThat::new(),
                results: midl_ndr::UniquePtr::new(ConformantArray::new(results)),
                ret: HResult::from_status(hresult::E_NOINTERFACE),
            })
        }
    }

    /// Routes client calls straight into the dispatcher.
    struct Direct(Arc<Releaser>);

    #[async_trait]
    impl Conn for Direct {
        async fn invoke_raw(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> dcerpc::Result<Bytes> {
            let mut call = Call::new(opnum, stub);
            if let Some(object) = opts.object {
                call = call.with_object(object);
            }
            RemUnknownServerHandle(self.0.clone()).handle(call).await
        }
    }

    #[tokio::test]
    async fn test_release_round_trip() {
        let server = Arc::new(Releaser::default());
        let client = RemUnknownClient::from_conn(Arc::new(Direct(server.clone()))).ipid(Ipid::generate());
        let target = RemInterfaceRef::new(Ipid::generate(), 3);
        let req = RemReleaseRequest {
            this: OrpcThis::new(),
            refs: vec![target.clone()],
        };
        client.rem_release(&req, &CallOptions::new()).await.unwrap();
        assert_eq!(server.released.lock().as_slice(), &[target]);
    }

    #[tokio::test]
    async fn test_unimplemented_method() {
        let server = Arc::new(Releaser::default());
        let client = RemUnknownClient::from_conn(Arc::new(Direct(server))).ipid(Ipid::generate());
        let err = client
            .rem_add_ref(&RemAddRefRequest::default(), &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DcomError::Transport {
                op: "/IRemUnknown/v0/RemAddRef",
                source: RpcError::NotImplemented
            }
        ));
    }

    #[tokio::test]
    async fn test_failing_hresult_surfaces() {
        let server = Arc::new(Releaser::default());
        let client = RemUnknownClient::from_conn(Arc::new(Direct(server))).ipid(Ipid::generate());
        let req = RemQueryInterfaceRequest {
            this: OrpcThis::new(),
            ipid: Ipid::generate(),
            refs: 1,
            iids: vec![crate::types::iid::IDISPATCH],
        };
        let err = client.rem_query_interface(&req, &CallOptions::new()).await.unwrap_err();
        assert_eq!(err.hresult().map(|h| h.code()), Some(hresult::E_NOINTERFACE));
    }

    #[tokio::test]
    async fn test_iunknown_opnums_unavailable() {
        let server = Releaser::default();
        let result = rem_unknown_server_handle(&server, Call::new(1, Bytes::new())).await;
        assert!(matches!(result, Err(RpcError::OperationUnavailable(1))));
        let result = rem_unknown_server_handle(&server, Call::new(9, Bytes::new())).await;
        assert!(matches!(result, Err(RpcError::OperationUnavailable(9))));
    }
}
