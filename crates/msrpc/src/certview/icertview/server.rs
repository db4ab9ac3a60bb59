//! ICertView server dispatch

use super::protocol::*;
use crate::oaut::idispatch::{dispatch_server_handle, DispatchServer, DISPATCH_OPNUM_COUNT};
use async_trait::async_trait;
use bytes::Bytes;
use dcom::types::Ipid;
use dcerpc::{marshal, Call, DceRpcServer, RpcError, ServerHandle};
use std::sync::Arc;
use tracing::debug;

/// Server side of ICertView. IDispatch methods come from the supertrait.
#[async_trait]
pub trait CertViewServer: DispatchServer {
    async fn open_connection(&self, _req: OpenConnectionRequest) -> dcerpc::Result<OpenConnectionResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn enum_cert_view_column(
        &self,
        _req: EnumCertViewColumnRequest,
    ) -> dcerpc::Result<EnumCertViewColumnResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn get_column_count(&self, _req: GetColumnCountRequest) -> dcerpc::Result<GetColumnCountResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn get_column_index(&self, _req: GetColumnIndexRequest) -> dcerpc::Result<GetColumnIndexResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn set_result_column_count(
        &self,
        _req: SetResultColumnCountRequest,
    ) -> dcerpc::Result<SetResultColumnCountResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn set_result_column(&self, _req: SetResultColumnRequest) -> dcerpc::Result<SetResultColumnResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn set_restriction(&self, _req: SetRestrictionRequest) -> dcerpc::Result<SetRestrictionResponse> {
        Err(RpcError::NotImplemented)
    }

    async fn open_view(&self, _req: OpenViewRequest) -> dcerpc::Result<OpenViewResponse> {
        Err(RpcError::NotImplemented)
    }
}

pub async fn cert_view_server_handle<S: CertViewServer + ?Sized>(server: &S, call: Call) -> dcerpc::Result<Bytes> {
    if call.opnum < DISPATCH_OPNUM_COUNT {
        return dispatch_server_handle(server, call).await;
    }
    debug!(opnum = call.opnum, object = ?call.object, "ICertView call");
    match call.opnum {
        opnum::OPEN_CONNECTION => marshal(&server.open_connection(call.decode()?).await?),
        opnum::ENUM_CERT_VIEW_COLUMN => marshal(&server.enum_cert_view_column(call.decode()?).await?),
        opnum::GET_COLUMN_COUNT => marshal(&server.get_column_count(call.decode()?).await?),
        opnum::GET_COLUMN_INDEX => marshal(&server.get_column_index(call.decode()?).await?),
        opnum::SET_RESULT_COLUMN_COUNT => marshal(&server.set_result_column_count(call.decode()?).await?),
        opnum::SET_RESULT_COLUMN => marshal(&server.set_result_column(call.decode()?).await?),
        opnum::SET_RESTRICTION => marshal(&server.set_restriction(call.decode()?).await?),
        opnum::OPEN_VIEW => marshal(&server.open_view(call.decode()?).await?),
        other => Err(RpcError::OperationUnavailable(other)),
    }
}

pub struct CertViewServerHandle<S>(pub Arc<S>);

#[async_trait]
impl<S: CertViewServer + 'static> ServerHandle for CertViewServerHandle<S> {
    async fn handle(&self, call: Call) -> dcerpc::Result<Bytes> {
        cert_view_server_handle(self.0.as_ref(), call).await
    }
}

pub async fn register_cert_view_server<S: CertViewServer + 'static>(
    rpc: &DceRpcServer,
    server: Arc<S>,
    ipid: Option<Ipid>,
) {
    rpc.register(
        CERT_VIEW_SYNTAX_V0_0,
        ipid.map(|ipid| ipid.uuid()),
        Arc::new(CertViewServerHandle(server)),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certview::icertview::CertViewClient;
    use crate::oaut::idispatch::{GetTypeInfoCountRequest, GetTypeInfoCountResponse};
    use crate::oaut::Bstr;
    use crate::orpc::OrpcResponse;
    use dcom::types::{hresult, DcomError, HResult, OrpcThat, OrpcThis};
    use dcom::UnknownServer;
    use dcerpc::{CallOptions, Conn};
    use parking_lot::Mutex;

    const COLUMNS: [&str; 3] = ["RequestID", "CommonName", "NotAfter"];

    #[derive(Default)]
    struct View {
        config: Mutex<Option<String>>,
    }

    impl UnknownServer for View {}

    #[async_trait]
    impl DispatchServer for View {
        async fn get_type_info_count(&self, _req: GetTypeInfoCountRequest) -> dcerpc::Result<GetTypeInfoCountResponse> {
            Ok(GetTypeInfoCountResponse {
                that: OrpcThat::new(),
                type_info_count: 0,
                ret: HResult::OK,
            })
        }
    }

    #[async_trait]
    impl CertViewServer for View {
        async fn open_connection(&self, req: OpenConnectionRequest) -> dcerpc::Result<OpenConnectionResponse> {
            *self.config.lock() = req.config.to_string_lossy();
            Ok(OrpcResponse::ok())
        }

        async fn get_column_index(&self, req: GetColumnIndexRequest) -> dcerpc::Result<GetColumnIndexResponse> {
            let name = req.column_name.to_string_lossy().unwrap_or_default();
            let found = COLUMNS.iter().position(|column| *column == name);
            Ok(ValueResponse {
                that: OrpcThat::new(),
                value: found.map_or(-1, |index| index as i32),
                ret: match found {
                    Some(_) => HResult::OK,
                    None => HResult::from_status(hresult::E_INVALIDARG),
                },
            })
        }
    }

    struct Direct(Arc<View>);

    #[async_trait]
    impl Conn for Direct {
        async fn invoke_raw(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> dcerpc::Result<Bytes> {
            let mut call = Call::new(opnum, stub);
            if let Some(object) = opts.object {
                call = call.with_object(object);
            }
            CertViewServerHandle(self.0.clone()).handle(call).await
        }
    }

    fn client(view: Arc<View>) -> CertViewClient {
        CertViewClient::from_conn(Arc::new(Direct(view))).ipid(Ipid::generate())
    }

    #[tokio::test]
    async fn test_open_connection_then_column_index() {
        let view = Arc::new(View::default());
        let client = client(view.clone());
        let req = OpenConnectionRequest {
            this: OrpcThis::new(),
            config: Bstr::new("ca01\\Issuing CA"),
        };
        client.open_connection(&req, &CallOptions::new()).await.unwrap();
        assert_eq!(view.config.lock().as_deref(), Some("ca01\\Issuing CA"));

        let req = GetColumnIndexRequest {
            this: OrpcThis::new(),
            result_column: 0,
            column_name: Bstr::new("NotAfter"),
        };
        let resp = client.get_column_index(&req, &CallOptions::new()).await.unwrap();
        assert_eq!(resp.value, 2);
    }

    #[tokio::test]
    async fn test_unknown_column() {
        let client = client(Arc::new(View::default()));
        let req = GetColumnIndexRequest {
            column_name: Bstr::new("Serial"),
            ..Default::default()
        };
        let err = client.get_column_index(&req, &CallOptions::new()).await.unwrap_err();
        assert!(matches!(
            err,
            DcomError::Call {
                op: "/ICertView/v0/GetColumnIndex",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_dispatch_shares_ipid() {
        let client = client(Arc::new(View::default()));
        let resp = client
            .dispatch()
            .get_type_info_count(&GetTypeInfoCountRequest::default(), &CallOptions::new())
            .await
            .unwrap();
        assert_eq!(resp.type_info_count, 0);
    }

    #[tokio::test]
    async fn test_missing_ipid() {
        let client = CertViewClient::from_conn(Arc::new(Direct(Arc::new(View::default()))));
        let err = client.open_view(&OpenViewRequest::default(), &CallOptions::new()).await.unwrap_err();
        assert!(matches!(err, DcomError::IpidMissing { op: "/ICertView/v0/OpenView" }));
    }

    #[tokio::test]
    async fn test_unimplemented_and_unknown_opnums() {
        let view = View::default();
        let call = Call::new(opnum::OPEN_VIEW, dcerpc::marshal(&OpenViewRequest::default()).unwrap());
        assert!(matches!(
            cert_view_server_handle(&view, call).await,
            Err(RpcError::NotImplemented)
        ));
        assert!(matches!(
            cert_view_server_handle(&view, Call::new(15, Bytes::new())).await,
            Err(RpcError::OperationUnavailable(15))
        ));
    }
}
