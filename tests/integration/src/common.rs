//! Shared helpers for the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use dcerpc::{DceRpcServer, DceRpcServerConfig, Interface, InterfaceBuilder, SyntaxId, Uuid};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const ECHO_UUID: &str = "5e1c0a7e-2b3d-4f60-9a1b-7c8d9e0f1a2b";
pub const ECHO_VERSION: (u16, u16) = (1, 0);

pub const NCA_OP_RNG_ERROR: u32 = 0x1c01_0002;
pub const NCA_UNK_IF: u32 = 0x1c01_0003;
pub const NCA_S_FAULT_NDR: u32 = 0x0000_06f7;

static LOGGING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .try_init();
    });
}

pub fn echo_syntax() -> SyntaxId {
    let uuid = Uuid::parse(ECHO_UUID).unwrap_or(Uuid::NIL);
    SyntaxId::new(uuid, ECHO_VERSION.0, ECHO_VERSION.1)
}

/// opnum 0 echoes its stub, opnum 1 answers with `n` pattern bytes, opnum 2
/// sleeps for the milliseconds in its stub before echoing.
pub fn create_echo_interface() -> Interface {
    InterfaceBuilder::from_syntax(echo_syntax())
        .operation(0, |args| async move { Ok(args) })
        .operation(1, |args: Bytes| async move {
            let size = args
                .get(..4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
                .ok_or_else(|| dcerpc::RpcError::CallRejected("missing size".to_string()))?;
            Ok(Bytes::from((0..size).map(|i| (i % 251) as u8).collect::<Vec<u8>>()))
        })
        .operation(2, |args: Bytes| async move {
            let millis = args.first().copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(u64::from(millis))).await;
            Ok(args)
        })
        .build()
}

/// A server listening on an ephemeral loopback port; aborted on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub rpc: Arc<DceRpcServer>,
    task: JoinHandle<dcerpc::Result<()>>,
}

impl TestServer {
    pub async fn start(rpc: DceRpcServer) -> Self {
        let rpc = Arc::new(rpc);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = rpc.clone();
        let task = tokio::spawn(async move { server.serve(listener).await });
        Self { addr, rpc, task }
    }
}

/// A server negotiating fragments of at most `max_frag` bytes.
pub fn frag_server(max_frag: u16) -> DceRpcServer {
    DceRpcServer::with_config(DceRpcServerConfig {
        max_pdu_size: 4 * 1024 * 1024,
        max_xmit_frag: max_frag,
        max_recv_frag: max_frag,
        ..Default::default()
    })
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deterministic xorshift byte source.
pub struct TestDataGenerator {
    state: u64,
}

impl TestDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    pub fn random_bytes(&mut self, len: usize) -> Bytes {
        Bytes::from((0..len).map(|_| self.next() as u8).collect::<Vec<u8>>())
    }

    pub fn random_u32(&mut self) -> u32 {
        self.next() as u32
    }
}

/// FNV-1a
pub fn compute_checksum(data: &[u8]) -> u64 {
    data.iter()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3))
}

#[derive(Default)]
pub struct ConcurrentStats {
    success: AtomicU64,
    failure: AtomicU64,
    latencies: Mutex<Vec<Duration>>,
}

impl ConcurrentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, latency: Duration) {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.latencies.lock().push(latency);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn avg_latency(&self) -> Duration {
        let latencies = self.latencies.lock();
        match latencies.len() {
            0 => Duration::ZERO,
            n => latencies.iter().sum::<Duration>() / n as u32,
        }
    }

    pub fn max_latency(&self) -> Duration {
        self.latencies.lock().iter().max().copied().unwrap_or_default()
    }
}
