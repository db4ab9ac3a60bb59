//! Stress tests
//!
//! Many associations and many calls against one server:
//! - concurrent clients with per-call integrity checks
//! - calls sharing one association from several tasks
//! - ORPC calls fanned out over many objects
//! - connection churn

mod common;

use async_trait::async_trait;
use bytes::Bytes;
use common::*;
use dcerpc::{CallOptions, DceRpcClient, DceRpcServer};
use dcom::remunknown::{RemAddRefRequest, RemAddRefResponse, RemInterfaceRef, RemUnknownClient, RemUnknownServer};
use dcom::types::{HResult, Ipid, OrpcThat, OrpcThis};
use dcom::UnknownServer;
use futures::future::join_all;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Barrier;

async fn echo_server() -> TestServer {
    let rpc = DceRpcServer::new();
    rpc.register_interface(create_echo_interface()).await;
    TestServer::start(rpc).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_concurrent_clients() {
    init_logging();
    const CLIENTS: usize = 32;
    const REQUESTS: usize = 50;

    let server = echo_server().await;
    let stats = Arc::new(ConcurrentStats::new());
    let barrier = Arc::new(Barrier::new(CLIENTS));

    let tasks = (0..CLIENTS).map(|client_id| {
        let stats = stats.clone();
        let barrier = barrier.clone();
        let addr = server.addr;
        tokio::spawn(async move {
            barrier.wait().await;
            let client = match DceRpcClient::connect(addr, echo_syntax()).await {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(client_id, error = %e, "connect failed");
                    stats.record_failure();
                    return;
                }
            };
            for req_id in 0..REQUESTS {
                let payload = Bytes::from(format!("client_{client_id}_request_{req_id}"));
                let start = Instant::now();
                match client.call(0, payload.clone()).await {
                    Ok(resp) if resp == payload => stats.record_success(start.elapsed()),
                    _ => stats.record_failure(),
                }
            }
        })
    });
    join_all(tasks).await;

    assert_eq!(stats.failure_count(), 0);
    assert_eq!(stats.success_count(), (CLIENTS * REQUESTS) as u64);
    tracing::info!(avg = ?stats.avg_latency(), max = ?stats.max_latency(), "concurrent clients");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_association_calls() {
    init_logging();
    const TASKS: usize = 16;
    const REQUESTS: usize = 40;

    let server = echo_server().await;
    let client = Arc::new(DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap());

    let tasks = (0..TASKS).map(|task| {
        let client = client.clone();
        tokio::spawn(async move {
            let mut data = TestDataGenerator::new(task as u64 + 1);
            for _ in 0..REQUESTS {
                let len = (data.random_u32() % 8192) as usize;
                let payload = data.random_bytes(len);
                let resp = client.call(0, payload.clone()).await.unwrap();
                assert_eq!(compute_checksum(&resp), compute_checksum(&payload));
            }
        })
    });
    for result in join_all(tasks).await {
        result.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connection_churn() {
    init_logging();
    const ROUNDS: usize = 100;

    let server = echo_server().await;
    for round in 0..ROUNDS {
        let client = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();
        let payload = Bytes::from(format!("round {round}"));
        assert_eq!(client.call(0, payload.clone()).await.unwrap(), payload);
    }

    // the server still answers after every association went away
    let client = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();
    assert_eq!(client.call(0, Bytes::from_static(b"ok")).await.unwrap(), "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_calls_do_not_block_other_clients() {
    init_logging();
    let server = echo_server().await;

    let slow = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();
    let slow_call = tokio::spawn(async move { slow.call(2, Bytes::from_static(&[250])).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();
    fast.call(0, Bytes::from_static(b"fast")).await.unwrap();
    assert!(!slow_call.is_finished());

    assert_eq!(slow_call.await.unwrap().unwrap().as_ref(), &[250]);
}

/// Counts references per object.
#[derive(Default)]
struct Counter {
    refs: AtomicU32,
}

impl UnknownServer for Counter {}

#[async_trait]
impl RemUnknownServer for Counter {
    async fn rem_add_ref(&self, req: RemAddRefRequest) -> dcerpc::Result<RemAddRefResponse> {
        let added: u32 = req.refs.iter().map(|r| r.public_refs).sum();
        self.refs.fetch_add(added, Ordering::Relaxed);
        Ok(RemAddRefResponse {
            that: OrpcThat::new(),
            results: vec![HResult::OK; req.refs.len()],
            ret: HResult::OK,
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_orpc_fan_out_over_objects() {
    init_logging();
    const OBJECTS: usize = 8;
    const CALLS: u32 = 25;

    let rpc = DceRpcServer::new();
    let mut objects = Vec::new();
    for _ in 0..OBJECTS {
        let ipid = Ipid::generate();
        let counter = Arc::new(Counter::default());
        dcom::remunknown::register_rem_unknown_server(&rpc, counter.clone(), Some(ipid)).await;
        objects.push((ipid, counter));
    }
    let server = TestServer::start(rpc).await;
    let client = Arc::new(DceRpcClient::dial(server.addr).await.unwrap());
    let rem = RemUnknownClient::new(&client).await.unwrap();

    let tasks = objects.iter().map(|(ipid, _)| {
        let rem = rem.clone();
        let ipid = *ipid;
        tokio::spawn(async move {
            let opts = CallOptions::new().with_object(ipid.uuid());
            for _ in 0..CALLS {
                let req = RemAddRefRequest {
                    this: OrpcThis::new(),
                    refs: vec![RemInterfaceRef::new(ipid, 2)],
                };
                rem.rem_add_ref(&req, &opts).await.unwrap();
            }
        })
    });
    for result in join_all(tasks).await {
        result.unwrap();
    }

    for (_, counter) in &objects {
        assert_eq!(counter.refs.load(Ordering::Relaxed), CALLS * 2);
    }
}
