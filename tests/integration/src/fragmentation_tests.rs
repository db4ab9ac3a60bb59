//! Fragmentation tests
//!
//! Requests and responses larger than the negotiated fragment size travel
//! as FIRST_FRAG .. LAST_FRAG sequences and must be reassembled intact:
//! - large requests, large responses, both at once
//! - the smallest fragment size a peer must accept
//! - many fragmented calls on parallel associations

mod common;

use bytes::Bytes;
use common::*;
use dcerpc::{DceRpcClient, DceRpcClientBuilder, MUST_RECV_FRAG_SIZE};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;

async fn echo_server(max_frag: u16) -> TestServer {
    let rpc = frag_server(max_frag);
    rpc.register_interface(create_echo_interface()).await;
    TestServer::start(rpc).await
}

fn size_request(size: usize) -> Bytes {
    Bytes::copy_from_slice(&(size as u32).to_le_bytes())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_large_request_fragmentation() {
    init_logging();
    const REQUEST_SIZE: usize = 100_000;

    let server = echo_server(4096).await;
    let client = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();
    let (xmit, _) = client.max_frag();
    assert!(xmit <= 4096, "negotiated xmit {} above the server limit", xmit);

    let payload = TestDataGenerator::new(7).random_bytes(REQUEST_SIZE);
    let response = client.call(0, payload.clone()).await.unwrap();
    assert_eq!(response.len(), REQUEST_SIZE);
    assert_eq!(compute_checksum(&response), compute_checksum(&payload));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_large_response_fragmentation() {
    init_logging();
    const RESPONSE_SIZE: usize = 150_000;

    let server = echo_server(4096).await;
    let client = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();

    let response = client.call(1, size_request(RESPONSE_SIZE)).await.unwrap();
    assert_eq!(response.len(), RESPONSE_SIZE);
    for (i, byte) in response.iter().enumerate() {
        assert_eq!(*byte, (i % 251) as u8, "pattern mismatch at byte {}", i);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_minimum_fragment_size() {
    init_logging();
    const DATA_SIZE: usize = 64 * 1024;

    let server = echo_server(MUST_RECV_FRAG_SIZE).await;
    let client = DceRpcClientBuilder::new()
        .max_frag(MUST_RECV_FRAG_SIZE)
        .connect(server.addr, echo_syntax())
        .await
        .unwrap();
    assert_eq!(client.max_frag(), (MUST_RECV_FRAG_SIZE, MUST_RECV_FRAG_SIZE));

    let payload = TestDataGenerator::new(11).random_bytes(DATA_SIZE);
    let response = client.call(0, payload.clone()).await.unwrap();
    assert_eq!(response, payload);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_boundary_sizes() {
    init_logging();

    let server = echo_server(2048).await;
    let client = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();
    let (xmit, _) = client.max_frag();
    // a request PDU without object UUID has a 24-byte header
    let body = xmit as usize - 24;
    let mut gen = TestDataGenerator::new(3);
    for size in [0, 1, body - 1, body, body + 1, 2 * body, 2 * body + 1] {
        let payload = gen.random_bytes(size);
        let response = client.call(0, payload.clone()).await.unwrap();
        assert_eq!(response, payload, "echo of {} bytes", size);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_fragmentation_under_load() {
    init_logging();
    const NUM_CLIENTS: usize = 10;
    const REQUESTS_PER_CLIENT: usize = 5;
    const DATA_SIZE: usize = 50_000;

    let server = echo_server(4096).await;
    let stats = Arc::new(ConcurrentStats::new());

    let handles: Vec<_> = (0..NUM_CLIENTS)
        .map(|client_id| {
            let stats = stats.clone();
            let addr = server.addr;
            tokio::spawn(async move {
                let client = match DceRpcClient::connect(addr, echo_syntax()).await {
                    Ok(client) => client,
                    Err(e) => {
                        eprintln!("client {} failed to connect: {}", client_id, e);
                        stats.record_failure();
                        return;
                    }
                };
                let mut gen = TestDataGenerator::new(client_id as u64 * 12345 + 1);
                for _ in 0..REQUESTS_PER_CLIENT {
                    let payload = gen.random_bytes(DATA_SIZE);
                    let start = Instant::now();
                    match client.call(0, payload.clone()).await {
                        Ok(response) if response == payload => stats.record_success(start.elapsed()),
                        Ok(_) => stats.record_failure(),
                        Err(e) => {
                            eprintln!("client {} call failed: {}", client_id, e);
                            stats.record_failure();
                        }
                    }
                }
            })
        })
        .collect();
    join_all(handles).await;

    let total = (NUM_CLIENTS * REQUESTS_PER_CLIENT) as u64;
    println!(
        "fragmented calls: {}/{} ok, avg {:?}, max {:?}",
        stats.success_count(),
        total,
        stats.avg_latency(),
        stats.max_latency()
    );
    assert_eq!(stats.success_count(), total);
    assert_eq!(stats.failure_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_very_large_payload() {
    init_logging();
    const DATA_SIZE: usize = 1_000_000;

    let server = echo_server(4096).await;
    let client = DceRpcClient::connect(server.addr, echo_syntax()).await.unwrap();

    let payload = TestDataGenerator::new(999).random_bytes(DATA_SIZE);
    let start = Instant::now();
    let response = client.call(0, payload.clone()).await.unwrap();
    println!("1MB echo in {:?}", start.elapsed());
    assert_eq!(compute_checksum(&response), compute_checksum(&payload));
}
