//! DCOM services demo server
//!
//! Hosts an object exporter, IRemUnknown and two objects on one TCP port:
//! a CA database view (ICertView) and an IIS service controller
//! (IIisServiceControl).
//!
//! USAGE:
//!   dcom-services-server [--host HOST] [--port PORT] [--verbose]

mod common;

use async_trait::async_trait;
use clap::Parser;
use common::*;
use dcerpc::{DceRpcServer, DceRpcServerConfig};
use dcom::oxid_resolver::{
    register_object_exporter_server, ComplexPingRequest, ComplexPingResponse, ObjectExporterServer,
    ResolveOxid2Response, ResolveOxidRequest, ResolveOxidResponse, ServerAlive2Response, SimplePingRequest,
    StatusResponse,
};
use dcom::remunknown::{
    register_rem_unknown_server, RemAddRefRequest, RemAddRefResponse, RemQiResult, RemQueryInterfaceRequest,
    RemQueryInterfaceResponse, RemReleaseRequest, RemReleaseResponse, RemUnknownServer,
};
use dcom::types::{hresult, iid, DualStringArray, HResult, Iid, Ipid, Oid, OrpcThat, SetId, StdObjRef};
use dcom::{UnknownServer, DCOM_VERSION};
use midl_ndr::{ConformantArray, UniquePtr};
use msrpc::certview::icertview::*;
use msrpc::certview::column_kind;
use msrpc::iiss::iiisservicecontrol::{
    register_iis_service_control_server, IisServiceControlServer, KillRequest, KillResponse, RebootRequest,
    RebootResponse, StartRequest, StartResponse, StatusRequest, StopRequest, StopResponse,
};
use msrpc::oaut::idispatch::{DispatchServer, GetTypeInfoCountRequest, GetTypeInfoCountResponse};
use msrpc::oaut::Variant;
use msrpc::OrpcResponse;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

const OR_INVALID_OXID: u32 = 1910;

#[derive(Parser, Debug)]
#[command(name = "dcom-services-server")]
#[command(version)]
#[command(about = "Serves a CA view and an IIS service controller over DCOM")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Log every call
    #[arg(short, long)]
    verbose: bool,
}

struct Exporter {
    binding: String,
}

impl Exporter {
    fn bindings(&self) -> UniquePtr<DualStringArray> {
        UniquePtr::new(DualStringArray::with_tcp_binding(&self.binding))
    }
}

#[async_trait]
impl ObjectExporterServer for Exporter {
    async fn resolve_oxid(&self, req: ResolveOxidRequest) -> dcerpc::Result<ResolveOxidResponse> {
        if req.oxid != DEMO_OXID {
            return Ok(ResolveOxidResponse {
                ret: OR_INVALID_OXID,
                ..Default::default()
            });
        }
        Ok(ResolveOxidResponse {
            oxid_bindings: self.bindings(),
            rem_unknown: REM_UNKNOWN,
            authn_hint: 1,
            ret: 0,
        })
    }

    async fn resolve_oxid2(&self, req: ResolveOxidRequest) -> dcerpc::Result<ResolveOxid2Response> {
        if req.oxid != DEMO_OXID {
            return Ok(ResolveOxid2Response {
                ret: OR_INVALID_OXID,
                ..Default::default()
            });
        }
        Ok(ResolveOxid2Response {
            oxid_bindings: self.bindings(),
            rem_unknown: REM_UNKNOWN,
            authn_hint: 1,
            com_version: DCOM_VERSION,
            ret: 0,
        })
    }

    async fn simple_ping(&self, req: SimplePingRequest) -> dcerpc::Result<StatusResponse> {
        debug!(set_id = %req.set_id, "ping");
        Ok(StatusResponse::default())
    }

    async fn complex_ping(&self, req: ComplexPingRequest) -> dcerpc::Result<ComplexPingResponse> {
        let set_id = match req.set_id.0 {
            0 => SetId::generate(),
            _ => req.set_id,
        };
        Ok(ComplexPingResponse {
            set_id,
            ping_backoff_factor: 2,
            ret: 0,
        })
    }

    async fn server_alive2(&self) -> dcerpc::Result<ServerAlive2Response> {
        Ok(ServerAlive2Response {
            com_version: DCOM_VERSION,
            bindings: self.bindings(),
            reserved: 0,
            ret: 0,
        })
    }
}

/// One exported object: its IUnknown, its single interface and the IPID
/// of that interface.
struct Export {
    unknown: Ipid,
    oid: Oid,
    iid: Iid,
    ipid: Ipid,
}

const EXPORTS: [Export; 2] = [
    Export {
        unknown: CERT_VIEW_UNKNOWN,
        oid: CERT_VIEW_OID,
        iid: CERT_VIEW_IID,
        ipid: CERT_VIEW_IPID,
    },
    Export {
        unknown: IIS_UNKNOWN,
        oid: IIS_OID,
        iid: msrpc::iiss::iiisservicecontrol::IIS_SERVICE_CONTROL_IID,
        ipid: IIS_IPID,
    },
];

/// IRemUnknown over [`EXPORTS`], counting public references per IPID.
#[derive(Default)]
struct RemUnknown {
    refs: Mutex<HashMap<Ipid, u32>>,
}

impl RemUnknown {
    fn query(&self, export: &Export, requested: &Iid, refs: u32) -> RemQiResult {
        let ipid = if *requested == export.iid || *requested == iid::IDISPATCH {
            export.ipid
        } else if *requested == iid::IUNKNOWN {
            export.unknown
        } else {
            return RemQiResult::failed(HResult::from_status(hresult::E_NOINTERFACE));
        };
        *self.refs.lock().entry(ipid).or_default() += refs;
        RemQiResult::ok(StdObjRef::new(DEMO_OXID, export.oid, ipid, refs))
    }
}

impl UnknownServer for RemUnknown {}

#[async_trait]
impl RemUnknownServer for RemUnknown {
    async fn rem_query_interface(
        &self,
        req: RemQueryInterfaceRequest,
    ) -> dcerpc::Result<RemQueryInterfaceResponse> {
        let Some(export) = EXPORTS
            .iter()
            .find(|export| export.unknown == req.ipid || export.ipid == req.ipid)
        else {
            return Ok(RemQueryInterfaceResponse {
                that: OrpcThat::new(),
                results: UniquePtr::null(),
                ret: HResult::from_status(hresult::CO_E_OBJNOTCONNECTED),
            });
        };
        let results: Vec<RemQiResult> = req.iids.iter().map(|requested| self.query(export, requested, req.refs)).collect();
        let ret = match results.iter().any(|result| result.hresult.is_success()) {
            true => HResult::OK,
            false => HResult::from_status(hresult::E_NOINTERFACE),
        };
        info!(ipid = %req.ipid, count = results.len(), %ret, "RemQueryInterface");
        Ok(RemQueryInterfaceResponse {
            that: OrpcThat::new(),
            results: UniquePtr::new(ConformantArray::new(results)),
            ret,
        })
    }

    async fn rem_add_ref(&self, req: RemAddRefRequest) -> dcerpc::Result<RemAddRefResponse> {
        let mut refs = self.refs.lock();
        let results = req
            .refs
            .iter()
            .map(|r| match refs.get_mut(&r.ipid) {
                Some(count) => {
                    *count += r.public_refs;
                    HResult::OK
                }
                None => HResult::from_status(hresult::E_INVALIDARG),
            })
            .collect();
        Ok(RemAddRefResponse {
            that: OrpcThat::new(),
            results,
            ret: HResult::OK,
        })
    }

    async fn rem_release(&self, req: RemReleaseRequest) -> dcerpc::Result<RemReleaseResponse> {
        let mut refs = self.refs.lock();
        for r in &req.refs {
            if let Some(count) = refs.get_mut(&r.ipid) {
                *count = count.saturating_sub(r.public_refs);
                debug!(ipid = %r.ipid, remaining = *count, "released");
            }
        }
        Ok(RemReleaseResponse {
            that: OrpcThat::new(),
            ret: HResult::OK,
        })
    }
}

const COLUMNS: [&str; 6] = [
    "RequestID",
    "Request.Disposition",
    "CommonName",
    "SerialNumber",
    "NotBefore",
    "NotAfter",
];

#[derive(Default)]
struct ViewState {
    config: Option<String>,
    result_count: usize,
    result_columns: Vec<i32>,
    restrictions: Vec<(i32, i32, i32, Variant)>,
}

/// A read-only CA database schema with no rows.
#[derive(Default)]
struct CaView {
    state: Mutex<ViewState>,
}

fn failure(code: u32) -> HResult {
    HResult::from_status(code)
}

fn value(value: i32) -> ValueResponse {
    ValueResponse {
        that: OrpcThat::new(),
        value,
        ret: HResult::OK,
    }
}

fn value_error(code: u32) -> ValueResponse {
    ValueResponse {
        that: OrpcThat::new(),
        value: 0,
        ret: failure(code),
    }
}

impl UnknownServer for CaView {}

#[async_trait]
impl DispatchServer for CaView {
    async fn get_type_info_count(&self, _req: GetTypeInfoCountRequest) -> dcerpc::Result<GetTypeInfoCountResponse> {
        Ok(GetTypeInfoCountResponse {
            that: OrpcThat::new(),
            type_info_count: 0,
            ret: HResult::OK,
        })
    }
}

#[async_trait]
impl CertViewServer for CaView {
    async fn open_connection(&self, req: OpenConnectionRequest) -> dcerpc::Result<OpenConnectionResponse> {
        let config = req.config.to_string_lossy().unwrap_or_default();
        if config.is_empty() {
            return Ok(OrpcResponse::new(failure(hresult::E_INVALIDARG)));
        }
        info!(%config, "view opened");
        self.state.lock().config = Some(config);
        Ok(OrpcResponse::ok())
    }

    async fn get_column_count(&self, req: GetColumnCountRequest) -> dcerpc::Result<GetColumnCountResponse> {
        let state = self.state.lock();
        if state.config.is_none() {
            return Ok(value_error(hresult::E_UNEXPECTED));
        }
        Ok(match req.result_column {
            column_kind::RESULT_COLUMN => value(state.result_columns.len() as i32),
            _ => value(COLUMNS.len() as i32),
        })
    }

    async fn get_column_index(&self, req: GetColumnIndexRequest) -> dcerpc::Result<GetColumnIndexResponse> {
        let state = self.state.lock();
        if state.config.is_none() {
            return Ok(value_error(hresult::E_UNEXPECTED));
        }
        let name = req.column_name.to_string_lossy().unwrap_or_default();
        Ok(match COLUMNS.iter().position(|column| column.eq_ignore_ascii_case(&name)) {
            Some(index) => value(index as i32),
            None => value_error(hresult::E_INVALIDARG),
        })
    }

    async fn set_result_column_count(
        &self,
        req: SetResultColumnCountRequest,
    ) -> dcerpc::Result<SetResultColumnCountResponse> {
        let mut state = self.state.lock();
        match usize::try_from(req.value) {
            Ok(count) if count <= COLUMNS.len() => {
                state.result_count = count;
                state.result_columns.clear();
                Ok(OrpcResponse::ok())
            }
            _ => Ok(OrpcResponse::new(failure(hresult::E_INVALIDARG))),
        }
    }

    async fn set_result_column(&self, req: SetResultColumnRequest) -> dcerpc::Result<SetResultColumnResponse> {
        let mut state = self.state.lock();
        let in_range = usize::try_from(req.value).is_ok_and(|index| index < COLUMNS.len());
        if !in_range || state.result_columns.len() >= state.result_count {
            return Ok(OrpcResponse::new(failure(hresult::E_INVALIDARG)));
        }
        state.result_columns.push(req.value);
        Ok(OrpcResponse::ok())
    }

    async fn set_restriction(&self, req: SetRestrictionRequest) -> dcerpc::Result<SetRestrictionResponse> {
        let Some(value) = req.value.into_option() else {
            return Ok(OrpcResponse::new(failure(hresult::E_POINTER)));
        };
        debug!(column = req.column_index, seek = req.seek_operator, ?value, "restriction");
        self.state
            .lock()
            .restrictions
            .push((req.column_index, req.seek_operator, req.sort_order, value));
        Ok(OrpcResponse::ok())
    }
}

struct Iis {
    running: AtomicBool,
}

impl Iis {
    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        info!(running, "IIS services");
    }
}

impl UnknownServer for Iis {}
impl DispatchServer for Iis {}

#[async_trait]
impl IisServiceControlServer for Iis {
    async fn stop(&self, req: StopRequest) -> dcerpc::Result<StopResponse> {
        debug!(timeout = req.timeout_msecs, force = req.force, "stop");
        self.set_running(false);
        Ok(OrpcResponse::ok())
    }

    async fn start(&self, _req: StartRequest) -> dcerpc::Result<StartResponse> {
        self.set_running(true);
        Ok(OrpcResponse::ok())
    }

    async fn reboot(&self, req: RebootRequest) -> dcerpc::Result<RebootResponse> {
        info!(timeout = req.timeout_msecs, "reboot requested; restarting services instead");
        self.set_running(true);
        Ok(OrpcResponse::ok())
    }

    async fn status(&self, _req: StatusRequest) -> dcerpc::Result<msrpc::iiss::iiisservicecontrol::StatusResponse> {
        let state = match self.running.load(Ordering::SeqCst) {
            true => SERVICE_RUNNING,
            false => SERVICE_STOPPED,
        };
        let services: Vec<_> = IIS_SERVICES.iter().map(|name| (*name, state)).collect();
        let buffer = encode_status(&services);
        Ok(msrpc::iiss::iiisservicecontrol::StatusResponse {
            that: OrpcThat::new(),
            required_buffer_size: buffer.len() as u32,
            buffer,
            num_services: services.len() as u32,
            ret: HResult::OK,
        })
    }

    async fn kill(&self, _req: KillRequest) -> dcerpc::Result<KillResponse> {
        self.set_running(false);
        Ok(OrpcResponse::ok())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let rpc = DceRpcServer::with_config(DceRpcServerConfig::default());

    register_object_exporter_server(
        &rpc,
        Arc::new(Exporter {
            binding: format!("{}[{}]", args.host, args.port),
        }),
    )
    .await;
    register_rem_unknown_server(&rpc, Arc::new(RemUnknown::default()), Some(REM_UNKNOWN)).await;
    register_cert_view_server(&rpc, Arc::new(CaView::default()), Some(CERT_VIEW_IPID)).await;
    register_iis_service_control_server(
        &rpc,
        Arc::new(Iis {
            running: AtomicBool::new(true),
        }),
        Some(IIS_IPID),
    )
    .await;

    info!(%addr, oxid = %DEMO_OXID, "serving ICertView and IIisServiceControl");
    rpc.run_until(addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    })
    .await?;
    Ok(())
}
