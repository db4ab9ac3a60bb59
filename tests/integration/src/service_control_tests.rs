//! IIisServiceControl end to end, including status buffers larger than a
//! fragment

mod common;

use async_trait::async_trait;
use common::*;
use dcerpc::{CallOptions, DceRpcClientBuilder};
use dcom::types::{hresult, HResult, Ipid, OrpcThat, OrpcThis};
use dcom::{DcomError, UnknownServer};
use msrpc::iiss::iiisservicecontrol::*;
use msrpc::oaut::idispatch::DispatchServer;
use msrpc::OrpcResponse;
use parking_lot::Mutex;
use std::sync::Arc;

const MIN_FRAG: u16 = 1432;

/// Holds a fixed status blob and logs every control request.
struct Services {
    status: Vec<u8>,
    log: Mutex<Vec<String>>,
}

impl Services {
    fn new(status: Vec<u8>) -> Self {
        Self {
            status,
            log: Mutex::new(Vec::new()),
        }
    }
}

impl UnknownServer for Services {}

impl DispatchServer for Services {}

#[async_trait]
impl IisServiceControlServer for Services {
    async fn stop(&self, req: StopRequest) -> dcerpc::Result<StopResponse> {
        self.log
            .lock()
            .push(format!("stop {} {}", req.timeout_msecs, req.force));
        Ok(OrpcResponse::ok())
    }

    async fn start(&self, req: StartRequest) -> dcerpc::Result<StartResponse> {
        self.log.lock().push(format!("start {}", req.timeout_msecs));
        Ok(OrpcResponse::ok())
    }

    async fn reboot(&self, _req: RebootRequest) -> dcerpc::Result<RebootResponse> {
        Ok(OrpcResponse::new(HResult::from_status(hresult::E_ACCESSDENIED)))
    }

    async fn status(&self, _req: StatusRequest) -> dcerpc::Result<StatusResponse> {
        Ok(StatusResponse {
            that: OrpcThat::new(),
            buffer: self.status.clone(),
            required_buffer_size: self.status.len() as u32,
            num_services: 3,
            ret: HResult::OK,
        })
    }
}

async fn serve(status: Vec<u8>) -> (TestServer, Arc<Services>, IisServiceControlClient) {
    let services = Arc::new(Services::new(status));
    let ipid = Ipid::generate();
    let rpc = frag_server(MIN_FRAG);
    register_iis_service_control_server(&rpc, services.clone(), Some(ipid)).await;
    let server = TestServer::start(rpc).await;

    let client = DceRpcClientBuilder::new()
        .max_frag(MIN_FRAG)
        .dial(server.addr)
        .await
        .unwrap();
    let control = IisServiceControlClient::new(&Arc::new(client))
        .await
        .unwrap()
        .ipid(ipid);
    (server, services, control)
}

#[tokio::test]
async fn test_stop_and_start() {
    init_logging();
    let (_server, services, client) = serve(Vec::new()).await;
    let opts = CallOptions::new();

    client
        .stop(
            &StopRequest {
                this: OrpcThis::new(),
                timeout_msecs: 30_000,
                force: 1,
            },
            &opts,
        )
        .await
        .unwrap();
    client
        .start(
            &StartRequest {
                this: OrpcThis::new(),
                timeout_msecs: 5_000,
            },
            &opts,
        )
        .await
        .unwrap();
    assert_eq!(*services.log.lock(), vec!["stop 30000 1", "start 5000"]);
}

#[tokio::test]
async fn test_reboot_denied() {
    init_logging();
    let (_server, _services, client) = serve(Vec::new()).await;
    let err = client
        .reboot(&RebootRequest::default(), &CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DcomError::Call { op: "/IIisServiceControl/v0/Reboot", .. }));
    assert_eq!(err.hresult(), Some(HResult::from_status(hresult::E_ACCESSDENIED)));
}

#[tokio::test]
async fn test_status_spans_fragments() {
    init_logging();
    let mut data = TestDataGenerator::new(0x1125);
    let status = data.random_bytes(20 * 1024).to_vec();
    let (_server, _services, client) = serve(status.clone()).await;

    let resp = client
        .status(
            &StatusRequest {
                this: OrpcThis::new(),
                buffer_size: status.len() as u32,
            },
            &CallOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(resp.buffer.len(), status.len());
    assert_eq!(compute_checksum(&resp.buffer), compute_checksum(&status));
    assert_eq!(resp.required_buffer_size, status.len() as u32);
    assert_eq!(resp.num_services, 3);
}

#[tokio::test]
async fn test_status_buffer_padded_to_request() {
    init_logging();
    let (_server, _services, client) = serve(vec![0xab; 100]).await;

    let resp = client
        .status(
            &StatusRequest {
                this: OrpcThis::new(),
                buffer_size: 4096,
            },
            &CallOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(resp.buffer.len(), 4096);
    assert!(resp.buffer[..100].iter().all(|b| *b == 0xab));
    assert!(resp.buffer[100..].iter().all(|b| *b == 0));
    assert_eq!(resp.required_buffer_size, 100);
}

#[tokio::test]
async fn test_status_buffer_too_small() {
    init_logging();
    let (_server, _services, client) = serve(vec![0xcd; 3000]).await;

    let err = client
        .status(
            &StatusRequest {
                this: OrpcThis::new(),
                buffer_size: 16,
            },
            &CallOptions::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.hresult().map(|h| h.code()),
        Some(hresult::HRESULT_ERROR_INSUFFICIENT_BUFFER)
    );
    let resp = err.response::<StatusResponse>().unwrap();
    assert_eq!(resp.required_buffer_size, 3000);
    assert_eq!(resp.buffer.len(), 16);
    assert!(resp.buffer.iter().all(|b| *b == 0));

    // the reported size is enough for a retry over the fragmented path
    let resp = client
        .status(
            &StatusRequest {
                this: OrpcThis::new(),
                buffer_size: resp.required_buffer_size,
            },
            &CallOptions::new(),
        )
        .await
        .unwrap();
    assert!(resp.buffer.iter().all(|b| *b == 0xcd));
}

#[tokio::test]
async fn test_kill_not_implemented() {
    init_logging();
    let (_server, _services, client) = serve(Vec::new()).await;
    let err = client
        .kill(&KillRequest::default(), &CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.hresult().map(|h| h.code()), Some(NCA_OP_RNG_ERROR));
}

#[tokio::test]
async fn test_dispatch_defaults_on_same_object() {
    init_logging();
    let (_server, _services, client) = serve(Vec::new()).await;
    let err = client
        .dispatch()
        .get_type_info_count(&Default::default(), &CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.hresult().map(|h| h.code()), Some(NCA_OP_RNG_ERROR));
}
