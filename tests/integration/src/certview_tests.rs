//! ICertView end to end: a CA view object served over TCP

mod common;

use async_trait::async_trait;
use common::*;
use dcerpc::{CallOptions, DceRpcClient, DceRpcServer};
use dcom::types::{hresult, HResult, Ipid, OrpcThat, OrpcThis};
use dcom::{DcomError, UnknownServer};
use midl_ndr::UniquePtr;
use msrpc::certview::icertview::*;
use msrpc::certview::{column_kind, seek, sort};
use msrpc::oaut::idispatch::{
    DispatchServer, GetIdsOfNamesRequest, GetIdsOfNamesResponse, InvokeRequest, InvokeResponse,
};
use msrpc::oaut::{dispatch_flags, Bstr, DispParams, ExcepInfo, Variant};
use msrpc::OrpcResponse;
use parking_lot::Mutex;
use std::sync::Arc;

const COLUMNS: [&str; 4] = ["RequestID", "CommonName", "SerialNumber", "NotAfter"];
const DISPID_GET_COLUMN_COUNT: i32 = 3;

#[derive(Default)]
struct View {
    config: Mutex<Option<String>>,
    result_columns: Mutex<Vec<i32>>,
    restrictions: Mutex<Vec<(i32, i32, i32, Variant)>>,
}

impl View {
    fn column_count(&self, kind: i32) -> i32 {
        match kind {
            column_kind::RESULT_COLUMN => self.result_columns.lock().len() as i32,
            _ => COLUMNS.len() as i32,
        }
    }
}

impl UnknownServer for View {}

#[async_trait]
impl DispatchServer for View {
    async fn get_ids_of_names(&self, req: GetIdsOfNamesRequest) -> dcerpc::Result<GetIdsOfNamesResponse> {
        let disp_ids: Vec<i32> = req
            .names
            .iter()
            .map(|name| match name.as_str() {
                "GetColumnCount" => DISPID_GET_COLUMN_COUNT,
                _ => -1,
            })
            .collect();
        let ret = match disp_ids.contains(&-1) {
            true => HResult::from_status(hresult::DISP_E_UNKNOWNNAME),
            false => HResult::OK,
        };
        Ok(GetIdsOfNamesResponse {
            that: OrpcThat::new(),
            disp_ids,
            ret,
        })
    }

    async fn invoke(&self, req: InvokeRequest) -> dcerpc::Result<InvokeResponse> {
        if req.disp_id_member != DISPID_GET_COLUMN_COUNT {
            return Ok(InvokeResponse {
                that: OrpcThat::new(),
                ret: HResult::from_status(hresult::DISP_E_MEMBERNOTFOUND),
                ..Default::default()
            });
        }
        let kind = req.disp_params.args.first().and_then(|arg| arg.as_ref()).and_then(Variant::as_i64);
        match kind {
            Some(kind) => Ok(InvokeResponse {
                that: OrpcThat::new(),
                var_result: UniquePtr::new(Variant::I4(self.column_count(kind as i32))),
                ret: HResult::OK,
                ..Default::default()
            }),
            None => Ok(InvokeResponse {
                that: OrpcThat::new(),
                excep_info: ExcepInfo::new(
                    HResult::from_status(hresult::E_INVALIDARG),
                    "CertView",
                    "column kind missing",
                ),
                ret: HResult::from_status(hresult::DISP_E_EXCEPTION),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl CertViewServer for View {
    async fn open_connection(&self, req: OpenConnectionRequest) -> dcerpc::Result<OpenConnectionResponse> {
        *self.config.lock() = req.config.to_string_lossy();
        Ok(OrpcResponse::ok())
    }

    async fn get_column_count(&self, req: GetColumnCountRequest) -> dcerpc::Result<GetColumnCountResponse> {
        Ok(ValueResponse {
            that: OrpcThat::new(),
            value: self.column_count(req.result_column),
            ret: HResult::OK,
        })
    }

    async fn get_column_index(&self, req: GetColumnIndexRequest) -> dcerpc::Result<GetColumnIndexResponse> {
        let name = req.column_name.to_string_lossy().unwrap_or_default();
        let index = COLUMNS.iter().position(|column| *column == name);
        Ok(ValueResponse {
            that: OrpcThat::new(),
            value: index.map_or(-1, |i| i as i32),
            ret: match index {
                Some(_) => HResult::OK,
                None => HResult::from_status(hresult::E_INVALIDARG),
            },
        })
    }

    async fn set_result_column_count(
        &self,
        req: SetResultColumnCountRequest,
    ) -> dcerpc::Result<SetResultColumnCountResponse> {
        self.result_columns.lock().truncate(req.value.max(0) as usize);
        Ok(OrpcResponse::ok())
    }

    async fn set_result_column(&self, req: SetResultColumnRequest) -> dcerpc::Result<SetResultColumnResponse> {
        self.result_columns.lock().push(req.value);
        Ok(OrpcResponse::ok())
    }

    async fn set_restriction(&self, req: SetRestrictionRequest) -> dcerpc::Result<SetRestrictionResponse> {
        let value = req.value.into_option().unwrap_or_default();
        self.restrictions
            .lock()
            .push((req.column_index, req.seek_operator, req.sort_order, value));
        Ok(OrpcResponse::ok())
    }

    async fn open_view(&self, _req: OpenViewRequest) -> dcerpc::Result<OpenViewResponse> {
        Ok(EnumeratorResponse {
            that: OrpcThat::new(),
            enumerator: UniquePtr::null(),
            ret: HResult::from_status(hresult::E_NOTIMPL),
        })
    }
}

async fn serve_view() -> (TestServer, Arc<View>, CertViewClient) {
    let view = Arc::new(View::default());
    let ipid = Ipid::generate();
    let rpc = DceRpcServer::new();
    register_cert_view_server(&rpc, view.clone(), Some(ipid)).await;
    let server = TestServer::start(rpc).await;

    let client = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let view_client = CertViewClient::new(&client).await.unwrap().ipid(ipid);
    (server, view, view_client)
}

fn this() -> OrpcThis {
    OrpcThis::new()
}

#[tokio::test]
async fn test_open_and_query_columns() {
    init_logging();
    let (_server, view, client) = serve_view().await;
    let opts = CallOptions::new();

    client
        .open_connection(
            &OpenConnectionRequest {
                this: this(),
                config: Bstr::new("ca01.contoso.com\\Contoso Issuing CA"),
            },
            &opts,
        )
        .await
        .unwrap();
    assert_eq!(view.config.lock().as_deref(), Some("ca01.contoso.com\\Contoso Issuing CA"));

    let count = client
        .get_column_count(
            &GetColumnCountRequest {
                this: this(),
                result_column: column_kind::SCHEMA,
            },
            &opts,
        )
        .await
        .unwrap();
    assert_eq!(count.value, 4);

    for (expected, name) in COLUMNS.iter().enumerate() {
        let resp = client
            .get_column_index(
                &GetColumnIndexRequest {
                    this: this(),
                    result_column: column_kind::SCHEMA,
                    column_name: Bstr::new(name),
                },
                &opts,
            )
            .await
            .unwrap();
        assert_eq!(resp.value, expected as i32);
    }
}

#[tokio::test]
async fn test_unknown_column_reports_hresult() {
    init_logging();
    let (_server, _view, client) = serve_view().await;

    let err = client
        .get_column_index(
            &GetColumnIndexRequest {
                this: this(),
                result_column: 0,
                column_name: Bstr::new("Thumbprint"),
            },
            &CallOptions::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DcomError::Call { op: "/ICertView/v0/GetColumnIndex", .. }));
    assert_eq!(err.hresult(), Some(HResult::from_status(hresult::E_INVALIDARG)));
}

#[tokio::test]
async fn test_result_columns_and_restriction() {
    init_logging();
    let (_server, view, client) = serve_view().await;
    let opts = CallOptions::new();

    client
        .set_result_column_count(&SetResultColumnCountRequest { this: this(), value: 2 }, &opts)
        .await
        .unwrap();
    for column in [1, 3] {
        client
            .set_result_column(&SetResultColumnRequest { this: this(), value: column }, &opts)
            .await
            .unwrap();
    }
    let count = client
        .get_column_count(
            &GetColumnCountRequest {
                this: this(),
                result_column: column_kind::RESULT_COLUMN,
            },
            &opts,
        )
        .await
        .unwrap();
    assert_eq!(count.value, 2);

    client
        .set_restriction(
            &SetRestrictionRequest {
                this: this(),
                column_index: 3,
                seek_operator: seek::GE,
                sort_order: sort::DESCEND,
                value: UniquePtr::new(Variant::Date(45_000.5)),
            },
            &opts,
        )
        .await
        .unwrap();
    client
        .set_restriction(
            &SetRestrictionRequest {
                this: this(),
                column_index: 1,
                seek_operator: seek::EQ,
                sort_order: sort::NONE,
                value: UniquePtr::new(Variant::bstr("www.contoso.com")),
            },
            &opts,
        )
        .await
        .unwrap();

    let restrictions = view.restrictions.lock();
    assert_eq!(restrictions[0], (3, seek::GE, sort::DESCEND, Variant::Date(45_000.5)));
    assert_eq!(restrictions[1].3, Variant::bstr("www.contoso.com"));
}

#[tokio::test]
async fn test_open_view_failure_keeps_null_enumerator() {
    init_logging();
    let (_server, _view, client) = serve_view().await;
    let err = client
        .open_view(&OpenViewRequest { this: this() }, &CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.hresult().map(|h| h.code()), Some(hresult::E_NOTIMPL));
}

#[tokio::test]
async fn test_late_bound_call_through_dispatch() {
    init_logging();
    let (_server, _view, client) = serve_view().await;
    let dispatch = client.dispatch();
    let opts = CallOptions::new();

    let ids = dispatch
        .get_ids_of_names(
            &GetIdsOfNamesRequest {
                this: this(),
                names: vec!["GetColumnCount".to_string()],
                ..Default::default()
            },
            &opts,
        )
        .await
        .unwrap();
    assert_eq!(ids.disp_ids, vec![DISPID_GET_COLUMN_COUNT]);

    let resp = dispatch
        .invoke(
            &InvokeRequest {
                this: this(),
                disp_id_member: DISPID_GET_COLUMN_COUNT,
                flags: dispatch_flags::METHOD,
                disp_params: DispParams::positional([Variant::I4(column_kind::SCHEMA)]),
                ..Default::default()
            },
            &opts,
        )
        .await
        .unwrap();
    assert_eq!(resp.var_result.as_ref(), Some(&Variant::I4(4)));

    let err = dispatch
        .invoke(
            &InvokeRequest {
                this: this(),
                disp_id_member: DISPID_GET_COLUMN_COUNT,
                flags: dispatch_flags::METHOD,
                ..Default::default()
            },
            &opts,
        )
        .await
        .unwrap_err();
    assert_eq!(err.hresult().map(|h| h.code()), Some(hresult::DISP_E_EXCEPTION));
}
