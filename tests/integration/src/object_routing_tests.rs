//! Object routing tests
//!
//! Several objects exporting the same interface share one server; calls
//! reach the object named by the IPID carried as the object UUID.

mod common;

use async_trait::async_trait;
use common::*;
use dcerpc::{CallOptions, DceRpcClient, DceRpcServer, RpcError};
use dcom::oxid_resolver::{register_object_exporter_server, ObjectExporterClient, ObjectExporterServer};
use dcom::remunknown::{
    register_rem_unknown_server, RemInterfaceRef, RemReleaseRequest, RemReleaseResponse, RemUnknownClient,
    RemUnknownServer,
};
use dcom::types::{HResult, Ipid, OrpcThat, OrpcThis};
use dcom::{DcomError, UnknownServer};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records which object received each release.
struct Tagged {
    name: &'static str,
    log: Arc<Mutex<Vec<(&'static str, u32)>>>,
}

impl UnknownServer for Tagged {}

#[async_trait]
impl RemUnknownServer for Tagged {
    async fn rem_release(&self, req: RemReleaseRequest) -> dcerpc::Result<RemReleaseResponse> {
        let refs = req.refs.iter().map(|r| r.public_refs).sum();
        self.log.lock().push((self.name, refs));
        Ok(RemReleaseResponse {
            that: OrpcThat::new(),
            ret: HResult::OK,
        })
    }
}

struct Exporter;

impl ObjectExporterServer for Exporter {}

fn release(refs: u32) -> RemReleaseRequest {
    RemReleaseRequest {
        this: OrpcThis::new(),
        refs: vec![RemInterfaceRef::new(Ipid::generate(), refs)],
    }
}

async fn two_objects() -> (TestServer, Ipid, Ipid, Arc<Mutex<Vec<(&'static str, u32)>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let rpc = DceRpcServer::new();
    let (a, b) = (Ipid::generate(), Ipid::generate());
    register_rem_unknown_server(&rpc, Arc::new(Tagged { name: "a", log: log.clone() }), Some(a)).await;
    register_rem_unknown_server(&rpc, Arc::new(Tagged { name: "b", log: log.clone() }), Some(b)).await;
    (TestServer::start(rpc).await, a, b, log)
}

#[tokio::test]
async fn test_calls_reach_the_addressed_object() {
    init_logging();
    let (server, a, b, log) = two_objects().await;

    let rpc = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let client = RemUnknownClient::new(&rpc).await.unwrap();
    let opts = CallOptions::new();
    client.ipid(a).rem_release(&release(1), &opts).await.unwrap();
    client.ipid(b).rem_release(&release(2), &opts).await.unwrap();
    client.ipid(a).rem_release(&release(3), &opts).await.unwrap();

    assert_eq!(log.lock().as_slice(), &[("a", 1), ("b", 2), ("a", 3)]);
}

#[tokio::test]
async fn test_call_option_overrides_client_ipid() {
    init_logging();
    let (server, a, b, log) = two_objects().await;

    let rpc = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let client = RemUnknownClient::new(&rpc).await.unwrap().ipid(a);
    client
        .rem_release(&release(5), &CallOptions::new().with_object(b.uuid()))
        .await
        .unwrap();
    assert_eq!(log.lock().as_slice(), &[("b", 5)]);
}

#[tokio::test]
async fn test_unknown_object_faults() {
    init_logging();
    let (server, _, _, log) = two_objects().await;

    let rpc = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let client = RemUnknownClient::new(&rpc).await.unwrap().ipid(Ipid::generate());
    let err = client.rem_release(&release(1), &CallOptions::new()).await.unwrap_err();
    assert!(
        matches!(err, DcomError::Transport { source: RpcError::Fault(NCA_UNK_IF), .. }),
        "unexpected error: {}",
        err
    );
    assert!(log.lock().is_empty());

    // the association survives a fault
    let err = client.rem_release(&release(1), &CallOptions::new()).await.unwrap_err();
    assert_eq!(err.hresult().map(|h| h.code()), Some(NCA_UNK_IF));
}

#[tokio::test]
async fn test_unregistered_object_stops_receiving() {
    init_logging();
    let (server, a, b, log) = two_objects().await;
    let removed = server
        .rpc
        .unregister_object(&dcom::remunknown::REMUNKNOWN_IID, &a.uuid())
        .await;
    assert!(removed);

    let rpc = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let client = RemUnknownClient::new(&rpc).await.unwrap();
    assert!(client.ipid(a).rem_release(&release(1), &CallOptions::new()).await.is_err());
    client.ipid(b).rem_release(&release(1), &CallOptions::new()).await.unwrap();
    assert_eq!(log.lock().as_slice(), &[("b", 1)]);
}

#[tokio::test]
async fn test_missing_ipid_is_not_sent() {
    init_logging();
    let (server, _, _, log) = two_objects().await;

    let rpc = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let client = RemUnknownClient::new(&rpc).await.unwrap();
    let err = client.rem_release(&release(1), &CallOptions::new()).await.unwrap_err();
    assert!(matches!(err, DcomError::IpidMissing { op: "/IRemUnknown/v0/RemRelease" }));
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_unimplemented_method_faults_with_range_error() {
    init_logging();
    let (server, a, _, _) = two_objects().await;

    let rpc = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let client = RemUnknownClient::new(&rpc).await.unwrap().ipid(a);
    let err = client
        .rem_add_ref(&Default::default(), &CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DcomError::Transport {
            op: "/IRemUnknown/v0/RemAddRef",
            source: RpcError::Fault(NCA_OP_RNG_ERROR)
        }
    ));
}

#[tokio::test]
async fn test_exporter_alongside_objects() {
    init_logging();
    let log = Arc::new(Mutex::new(Vec::new()));
    let rpc = DceRpcServer::new();
    let ipid = Ipid::generate();
    register_object_exporter_server(&rpc, Arc::new(Exporter)).await;
    register_rem_unknown_server(&rpc, Arc::new(Tagged { name: "a", log: log.clone() }), Some(ipid)).await;
    let server = TestServer::start(rpc).await;

    // one association, two presentation contexts
    let client = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let exporter = ObjectExporterClient::new(&client).await.unwrap();
    let rem_unknown = RemUnknownClient::new(&client).await.unwrap().ipid(ipid);

    exporter.server_alive(&CallOptions::new()).await.unwrap();
    rem_unknown.rem_release(&release(4), &CallOptions::new()).await.unwrap();
    assert_eq!(client.bound_contexts().len(), 2);
    assert_eq!(log.lock().as_slice(), &[("a", 4)]);

    let err = exporter.server_alive2(&CallOptions::new()).await.unwrap_err();
    assert!(matches!(err, DcomError::Transport { source: RpcError::Fault(NCA_OP_RNG_ERROR), .. }));
}
