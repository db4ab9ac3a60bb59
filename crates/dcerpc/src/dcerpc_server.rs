//! DCE RPC Server
//!
//! Each accepted connection runs in its own Tokio task and negotiates any
//! number of presentation contexts through BIND and ALTER_CONTEXT. Requests
//! are routed by the interface bound to their context and then by the
//! object UUID in the request header, which lets one server host many DCOM
//! objects of the same interface, one per IPID.
//!
//! # Scalability Features
//!
//! - Semaphore-based connection limiting
//! - Server statistics tracking
//! - Graceful shutdown support
//! - Handlers are cloned out of the registry before they run

use crate::dcerpc::{
    reject_reason, BindAckPdu, BindNakPdu, BindPdu, DataRepresentation, FaultPdu, FaultStatus,
    PacketType, Pdu, PresentationResult, RequestPdu, ResponsePdu, SyntaxId, Uuid,
    DEFAULT_MAX_FRAG, MUST_RECV_FRAG_SIZE, NDR_SYNTAX,
};
use crate::dcerpc_transport::{DceRpcTransport, DEFAULT_MAX_PDU_SIZE};
use crate::error::{Result, RpcError};
use crate::fragmentation::{FragmentAssembler, FragmentGenerator};
use async_trait::async_trait;
use bytes::Bytes;
use midl_ndr::{NdrDecode, NdrReader};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use tracing::{debug, error, info, trace, warn};

/// One reassembled request as seen by a handler.
#[derive(Debug, Clone)]
pub struct Call {
    pub opnum: u16,
    /// Object UUID from the request header (the IPID for DCOM calls)
    pub object: Option<Uuid>,
    pub stub: Bytes,
    pub data_rep: DataRepresentation,
}

impl Call {
    pub fn new(opnum: u16, stub: Bytes) -> Self {
        Self {
            opnum,
            object: None,
            stub,
            data_rep: DataRepresentation::ndr(),
        }
    }

    pub fn with_object(mut self, object: Uuid) -> Self {
        self.object = Some(object);
        self
    }

    /// Reader over the stub in the caller's byte order.
    pub fn reader(&self) -> NdrReader {
        NdrReader::with_context(self.stub.clone(), self.data_rep.ndr_context())
    }

    /// Unmarshal the request parameters.
    pub fn decode<T: NdrDecode>(&self) -> Result<T> {
        Ok(self.reader().read_param()?)
    }
}

/// Dispatches calls for one registered interface (or one object of it).
#[async_trait]
pub trait ServerHandle: Send + Sync {
    async fn handle(&self, call: Call) -> Result<Bytes>;
}

/// Operation handler function type
pub type OperationHandler =
    Arc<dyn Fn(Bytes) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send>> + Send + Sync>;

/// Interface implemented as a table of per-opnum closures
pub struct Interface {
    pub syntax: SyntaxId,
    operations: HashMap<u16, OperationHandler>,
}

impl Interface {
    pub fn new(uuid: Uuid, major_version: u16, minor_version: u16) -> Self {
        Self::from_syntax(SyntaxId::new(uuid, major_version, minor_version))
    }

    pub fn from_syntax(syntax: SyntaxId) -> Self {
        Self {
            syntax,
            operations: HashMap::new(),
        }
    }

    pub fn register_operation<F, Fut>(&mut self, opnum: u16, handler: F)
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        self.operations
            .insert(opnum, Arc::new(move |args| Box::pin(handler(args))));
    }

    pub fn get_operation(&self, opnum: u16) -> Option<&OperationHandler> {
        self.operations.get(&opnum)
    }
}

#[async_trait]
impl ServerHandle for Interface {
    async fn handle(&self, call: Call) -> Result<Bytes> {
        let handler = self
            .get_operation(call.opnum)
            .ok_or(RpcError::OperationUnavailable(call.opnum))?;
        handler(call.stub).await
    }
}

/// Builder for closure-table interfaces
pub struct InterfaceBuilder {
    interface: Interface,
}

impl InterfaceBuilder {
    pub fn new(uuid: &str, major_version: u16, minor_version: u16) -> Option<Self> {
        let uuid = Uuid::parse(uuid)?;
        Some(Self {
            interface: Interface::new(uuid, major_version, minor_version),
        })
    }

    pub fn from_syntax(syntax: SyntaxId) -> Self {
        Self {
            interface: Interface::from_syntax(syntax),
        }
    }

    pub fn operation<F, Fut>(mut self, opnum: u16, handler: F) -> Self
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        self.interface.register_operation(opnum, handler);
        self
    }

    pub fn build(self) -> Interface {
        self.interface
    }
}

/// Fragmented requests one association may have in flight at once.
pub const DEFAULT_MAX_PENDING_CALLS: usize = 16;

/// DCE RPC Server configuration
#[derive(Debug, Clone)]
pub struct DceRpcServerConfig {
    pub max_pdu_size: usize,
    pub max_connections: usize,
    pub max_xmit_frag: u16,
    pub max_recv_frag: u16,
    /// Calls still collecting fragments, per association.
    pub max_pending_calls: usize,
    /// Stub bytes buffered for all of an association's pending calls
    /// together; also the largest single request stub.
    pub max_call_size: usize,
}

impl Default for DceRpcServerConfig {
    fn default() -> Self {
        Self {
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
            max_connections: 10000,
            max_xmit_frag: DEFAULT_MAX_FRAG,
            max_recv_frag: DEFAULT_MAX_FRAG,
            max_pending_calls: DEFAULT_MAX_PENDING_CALLS,
            max_call_size: midl_ndr::MAX_NDR_ALLOCATION_SIZE,
        }
    }
}

/// Server statistics
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_accepted: AtomicU64,
    pub connections_active: AtomicU64,
    pub connections_rejected: AtomicU64,
    pub requests_received: AtomicU64,
    pub requests_processed: AtomicU64,
    pub requests_failed: AtomicU64,
    pub bytes_received: AtomicU64,
    pub bytes_sent: AtomicU64,
}

impl ServerStats {
    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStatsSnapshot {
    pub connections_accepted: u64,
    pub connections_active: u64,
    pub connections_rejected: u64,
    pub requests_received: u64,
    pub requests_processed: u64,
    pub requests_failed: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Handles registered for one interface UUID.
struct Registration {
    syntax: SyntaxId,
    objects: HashMap<Uuid, Arc<dyn ServerHandle>>,
    fallback: Option<Arc<dyn ServerHandle>>,
}

impl Registration {
    fn route(&self, object: Option<&Uuid>) -> Option<Arc<dyn ServerHandle>> {
        object
            .and_then(|o| self.objects.get(o))
            .or(self.fallback.as_ref())
            .cloned()
    }
}

type Registry = Arc<RwLock<HashMap<Uuid, Registration>>>;

/// Map a handler error to the status sent in the FAULT PDU.
pub fn fault_status(err: &RpcError) -> u32 {
    match err {
        RpcError::NotImplemented | RpcError::OperationUnavailable(_) => FaultStatus::OpRngError as u32,
        RpcError::Ndr(_) => FaultStatus::BadStubData as u32,
        RpcError::Fault(status) => *status,
        RpcError::ContextMismatch(_) => FaultStatus::ContextMismatch as u32,
        RpcError::InterfaceNotFound(_) => FaultStatus::UnkIf as u32,
        _ => FaultStatus::RpcError as u32,
    }
}

/// DCE RPC Server
pub struct DceRpcServer {
    registry: Registry,
    config: DceRpcServerConfig,
    assoc_group_counter: Arc<AtomicU32>,
    stats: Arc<ServerStats>,
}

impl DceRpcServer {
    pub fn new() -> Self {
        Self::with_config(DceRpcServerConfig::default())
    }

    pub fn with_config(config: DceRpcServerConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            config,
            assoc_group_counter: Arc::new(AtomicU32::new(1)),
            stats: Arc::new(ServerStats::default()),
        }
    }

    pub fn config(&self) -> &DceRpcServerConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Register `handle` for `syntax`.
    ///
    /// With `Some(object)` the handle only receives calls addressed to that
    /// object UUID; with `None` it receives every call no object-specific
    /// registration claims.
    pub async fn register(&self, syntax: SyntaxId, object: Option<Uuid>, handle: Arc<dyn ServerHandle>) {
        let mut registry = self.registry.write().await;
        let entry = registry.entry(syntax.uuid).or_insert_with(|| Registration {
            syntax,
            objects: HashMap::new(),
            fallback: None,
        });
        entry.syntax = syntax;
        match object {
            Some(object) => {
                info!("Registering interface {} for object {}", syntax, object);
                entry.objects.insert(object, handle);
            }
            None => {
                info!("Registering interface {}", syntax);
                entry.fallback = Some(handle);
            }
        }
    }

    /// Remove the handle registered for `object` on `interface`.
    pub async fn unregister_object(&self, interface: &Uuid, object: &Uuid) -> bool {
        let mut registry = self.registry.write().await;
        registry
            .get_mut(interface)
            .map(|entry| entry.objects.remove(object).is_some())
            .unwrap_or(false)
    }

    /// Register a closure-table interface for every object.
    pub async fn register_interface(&self, interface: Interface) {
        let syntax = interface.syntax;
        self.register(syntax, None, Arc::new(interface)).await;
    }

    /// Bind `addr` and serve until an accept error.
    pub async fn run(&self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.serve_until(listener, std::future::pending::<()>()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F: Future<Output = ()>>(&self, addr: SocketAddr, shutdown: F) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_until(listener, shutdown).await
    }

    pub async fn serve_until<F: Future<Output = ()>>(&self, listener: TcpListener, shutdown: F) -> Result<()> {
        info!(
            "DCE RPC server listening on {} (max_connections: {})",
            listener.local_addr()?,
            self.config.max_connections
        );
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Server shutting down gracefully");
                    let _ = semaphore.acquire_many(self.config.max_connections as u32).await;
                    info!("All connections closed");
                    return Ok(());
                }

                result = listener.accept() => {
                    let (stream, peer_addr) = result?;
                    match semaphore.clone().try_acquire_owned() {
                        Ok(permit) => self.spawn_connection(stream, peer_addr, permit),
                        Err(_) => {
                            self.stats.connections_rejected.fetch_add(1, Ordering::Relaxed);
                            warn!("Connection limit reached, rejecting connection from {}", peer_addr);
                        }
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer_addr: SocketAddr, permit: OwnedSemaphorePermit) {
        self.stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.stats.connections_active.fetch_add(1, Ordering::Relaxed);
        debug!("Accepted connection from {}", peer_addr);

        let conn = Connection {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            assoc_group_counter: Arc::clone(&self.assoc_group_counter),
            stats: Arc::clone(&self.stats),
            contexts: HashMap::new(),
            pending: HashMap::new(),
            assoc_group_id: 0,
            max_xmit_frag: self.config.max_xmit_frag,
            max_recv_frag: self.config.max_recv_frag,
        };

        tokio::spawn(async move {
            let _permit = permit;
            let stats = Arc::clone(&conn.stats);
            let result = conn.run(stream).await;
            stats.connections_active.fetch_sub(1, Ordering::Relaxed);
            match result {
                Ok(()) | Err(RpcError::ConnectionClosed) => {
                    debug!("Connection closed from {}", peer_addr)
                }
                Err(e) => warn!("Connection error from {}: {}", peer_addr, e),
            }
        });
    }
}

impl Default for DceRpcServer {
    fn default() -> Self {
        Self::new()
    }
}

/// A request whose fragments are still arriving.
struct PendingCall {
    assembler: FragmentAssembler,
    object: Option<Uuid>,
    data_rep: DataRepresentation,
}

/// Per-connection association state
struct Connection {
    registry: Registry,
    config: DceRpcServerConfig,
    assoc_group_counter: Arc<AtomicU32>,
    stats: Arc<ServerStats>,
    /// context id -> interface UUID
    contexts: HashMap<u16, Uuid>,
    pending: HashMap<u32, PendingCall>,
    assoc_group_id: u32,
    max_xmit_frag: u16,
    max_recv_frag: u16,
}

impl Connection {
    async fn run(mut self, stream: TcpStream) -> Result<()> {
        let local_port = stream.local_addr()?.port();
        let (reader, writer) = stream.into_split();
        let mut read_transport = DceRpcTransport::new(reader).with_max_pdu_size(self.config.max_pdu_size);
        let mut write_transport = DceRpcTransport::new(writer);

        loop {
            let raw = read_transport.read_pdu().await?;
            self.stats.bytes_received.fetch_add(raw.len() as u64, Ordering::Relaxed);

            let replies = match Pdu::decode(&raw) {
                Ok(pdu) => self.process(pdu, local_port).await?,
                Err(e) => {
                    // Keep the association alive when only the body is bad.
                    let call_id = crate::dcerpc::PduHeader::decode(&raw)?.call_id;
                    warn!("Undecodable PDU for call_id={}: {}", call_id, e);
                    vec![FaultPdu::new(call_id, FaultStatus::ProtoError).encode()?]
                }
            };

            for reply in replies {
                self.stats.bytes_sent.fetch_add(reply.len() as u64, Ordering::Relaxed);
                write_transport.write_pdu(&reply).await?;
            }
        }
    }

    async fn process(&mut self, pdu: Pdu, local_port: u16) -> Result<Vec<Bytes>> {
        match pdu {
            Pdu::Bind(bind) => {
                if self.assoc_group_id != 0 {
                    warn!("Second BIND on an established association");
                    let nak = BindNakPdu::new(bind.header.call_id, BindNakPdu::REASON_NOT_SPECIFIED);
                    return Ok(vec![nak.encode()?]);
                }
                self.assoc_group_id = if bind.assoc_group_id != 0 {
                    bind.assoc_group_id
                } else {
                    self.assoc_group_counter.fetch_add(1, Ordering::SeqCst)
                };
                self.max_xmit_frag = self.config.max_xmit_frag.min(bind.max_recv_frag).max(MUST_RECV_FRAG_SIZE);
                self.max_recv_frag = self.config.max_recv_frag.min(bind.max_xmit_frag).max(MUST_RECV_FRAG_SIZE);

                let mut ack = self.negotiate(&bind, PacketType::BindAck).await;
                ack.secondary_addr = local_port.to_string();
                Ok(vec![ack.encode()?])
            }

            Pdu::AlterContext(alter) => {
                if self.assoc_group_id == 0 {
                    warn!("ALTER_CONTEXT before BIND");
                    return Ok(vec![FaultPdu::new(alter.header.call_id, FaultStatus::ProtoError).encode()?]);
                }
                let ack = self.negotiate(&alter, PacketType::AlterContextResp).await;
                Ok(vec![ack.encode()?])
            }

            Pdu::Request(request) => self.process_request(request).await,

            Pdu::Control(header) => {
                if header.packet_type == PacketType::Orphaned && self.pending.remove(&header.call_id).is_some() {
                    debug!("Dropped orphaned call {}", header.call_id);
                } else {
                    trace!("Ignoring {:?} for call_id={}", header.packet_type, header.call_id);
                }
                Ok(Vec::new())
            }

            other => {
                warn!("Unexpected {:?} PDU from client", other.header().packet_type);
                Ok(Vec::new())
            }
        }
    }

    /// Accept or reject every context offered in a BIND or ALTER_CONTEXT.
    async fn negotiate(&mut self, bind: &BindPdu, reply_type: PacketType) -> BindAckPdu {
        let registry = self.registry.read().await;
        let mut results = Vec::with_capacity(bind.context_list.len());

        for context in &bind.context_list {
            let offered = context.abstract_syntax;
            let registered = registry
                .get(&offered.uuid)
                .map(|r| r.syntax.major_version() == offered.major_version())
                .unwrap_or(false);
            let ndr = context.transfer_syntaxes.iter().any(|ts| *ts == NDR_SYNTAX);

            let result = if !registered {
                PresentationResult::rejected(reject_reason::ABSTRACT_SYNTAX_NOT_SUPPORTED)
            } else if !ndr {
                PresentationResult::rejected(reject_reason::PROPOSED_TRANSFER_SYNTAXES_NOT_SUPPORTED)
            } else {
                self.contexts.insert(context.context_id, offered.uuid);
                PresentationResult::accepted(NDR_SYNTAX)
            };
            debug!(
                "Context {} for {}: {:?}",
                context.context_id, offered, result.result
            );
            results.push(result);
        }

        if results.is_empty() {
            results.push(PresentationResult::rejected(reject_reason::NOT_SPECIFIED));
        }

        let mut ack = BindAckPdu::new(reply_type, bind.header.call_id, self.assoc_group_id, results);
        ack.max_xmit_frag = self.max_xmit_frag;
        ack.max_recv_frag = self.max_recv_frag;
        ack
    }

    async fn process_request(&mut self, request: RequestPdu) -> Result<Vec<Bytes>> {
        let call_id = request.header.call_id;
        let flags = request.header.packet_flags;

        let (stub, object, data_rep) = if flags.is_first_frag() && flags.is_last_frag() {
            (request.stub_data.clone(), request.object_uuid, request.header.data_rep)
        } else {
            if let Err(e) = self.admit_fragment(call_id, request.stub_data.len()) {
                self.pending.remove(&call_id);
                warn!("Refusing fragment of call {}: {}", call_id, e);
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                return Ok(vec![FaultPdu::new(call_id, FaultStatus::ProtoError).encode()?]);
            }
            let max_size = self.config.max_call_size;
            let pending = self.pending.entry(call_id).or_insert_with(|| PendingCall {
                assembler: FragmentAssembler::with_limit(call_id, max_size),
                object: request.object_uuid,
                data_rep: request.header.data_rep,
            });
            let added = pending.assembler.add_fragment(
                &request.header,
                &request.stub_data,
                request.context_id,
                Some(request.opnum),
                request.alloc_hint,
            );
            match added {
                Ok(None) => return Ok(Vec::new()),
                Ok(Some(stub)) => {
                    let done = self.pending.remove(&call_id);
                    let (object, data_rep) = done
                        .map(|p| (p.object, p.data_rep))
                        .unwrap_or((request.object_uuid, request.header.data_rep));
                    (stub, object, data_rep)
                }
                Err(e) => {
                    self.pending.remove(&call_id);
                    warn!("Fragment error for call {}: {}", call_id, e);
                    self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                    return Ok(vec![FaultPdu::new(call_id, FaultStatus::ProtoError).encode()?]);
                }
            }
        };

        self.stats.requests_received.fetch_add(1, Ordering::Relaxed);
        let call = Call {
            opnum: request.opnum,
            object,
            stub,
            data_rep,
        };

        match self.dispatch(request.context_id, call).await {
            Ok(result) => {
                self.stats.requests_processed.fetch_add(1, Ordering::Relaxed);
                let mut response = ResponsePdu::new(call_id, result);
                response.context_id = request.context_id;
                FragmentGenerator::fragment_response(&response, self.max_xmit_frag)
                    .iter()
                    .map(|frag| frag.encode())
                    .collect()
            }
            Err(status) => {
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                let mut fault = FaultPdu::with_status(call_id, status);
                fault.context_id = request.context_id;
                Ok(vec![fault.encode()?])
            }
        }
    }

    /// Check a request fragment against the association's reassembly budget.
    fn admit_fragment(&self, call_id: u32, len: usize) -> Result<()> {
        if !self.pending.contains_key(&call_id) && self.pending.len() >= self.config.max_pending_calls {
            return Err(RpcError::FragmentAssemblyError(format!(
                "{} calls already pending",
                self.pending.len()
            )));
        }
        let buffered: usize = self.pending.values().map(|p| p.assembler.buffered()).sum();
        if buffered + len > self.config.max_call_size {
            return Err(RpcError::RecordTooLarge {
                size: buffered + len,
                max: self.config.max_call_size,
            });
        }
        Ok(())
    }

    /// Route a call to its handler, returning the fault status on failure.
    async fn dispatch(&self, context_id: u16, call: Call) -> std::result::Result<Bytes, u32> {
        let interface = match self.contexts.get(&context_id) {
            Some(uuid) => *uuid,
            None => {
                warn!("Request on unbound context {}", context_id);
                return Err(FaultStatus::ContextMismatch as u32);
            }
        };

        let handle = {
            let registry = self.registry.read().await;
            registry
                .get(&interface)
                .and_then(|r| r.route(call.object.as_ref()))
        };
        let handle = match handle {
            Some(handle) => handle,
            None => {
                warn!(
                    "No handler for interface {} object {:?}",
                    interface, call.object
                );
                return Err(FaultStatus::UnkIf as u32);
            }
        };

        let opnum = call.opnum;
        debug!(
            "Dispatching opnum={} on {} (object {:?}, stub_len={})",
            opnum,
            interface,
            call.object,
            call.stub.len()
        );
        handle.handle(call).await.map_err(|e| {
            let status = fault_status(&e);
            match &e {
                RpcError::NotImplemented | RpcError::OperationUnavailable(_) => {
                    debug!("opnum {} on {}: {}", opnum, interface, e)
                }
                _ => error!("opnum {} on {} failed: {}", opnum, interface, e),
            }
            status
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcerpc::{ContextElement, ContextResult};

    fn syntax(uuid: &str, major: u16) -> SyntaxId {
        SyntaxId::new(Uuid::parse(uuid).unwrap(), major, 0)
    }

    fn test_connection(registry: Registry) -> Connection {
        Connection {
            registry,
            config: DceRpcServerConfig::default(),
            assoc_group_counter: Arc::new(AtomicU32::new(1)),
            stats: Arc::new(ServerStats::default()),
            contexts: HashMap::new(),
            pending: HashMap::new(),
            assoc_group_id: 0,
            max_xmit_frag: DEFAULT_MAX_FRAG,
            max_recv_frag: DEFAULT_MAX_FRAG,
        }
    }

    struct Tagged(&'static [u8]);

    #[async_trait]
    impl ServerHandle for Tagged {
        async fn handle(&self, _call: Call) -> Result<Bytes> {
            Ok(Bytes::from_static(self.0))
        }
    }

    #[test]
    fn test_interface_builder() {
        let interface = InterfaceBuilder::new("12345678-1234-1234-1234-123456789012", 1, 0)
            .unwrap()
            .operation(0, |_args| async { Ok(Bytes::new()) })
            .operation(1, |_args| async { Ok(Bytes::from_static(b"hello")) })
            .build();

        assert!(interface.get_operation(0).is_some());
        assert!(interface.get_operation(1).is_some());
        assert!(interface.get_operation(2).is_none());
    }

    #[tokio::test]
    async fn test_interface_unknown_opnum() {
        let interface = InterfaceBuilder::new("12345678-1234-1234-1234-123456789012", 1, 0)
            .unwrap()
            .operation(0, |args| async move { Ok(args) })
            .build();
        let result = interface.handle(Call::new(5, Bytes::new())).await;
        assert!(matches!(result, Err(RpcError::OperationUnavailable(5))));
    }

    #[test]
    fn test_fault_status_mapping() {
        assert_eq!(fault_status(&RpcError::NotImplemented), 0x1c01_0002);
        assert_eq!(fault_status(&RpcError::OperationUnavailable(9)), 0x1c01_0002);
        assert_eq!(
            fault_status(&RpcError::Ndr(midl_ndr::NdrError::NullRefPointer)),
            0x6f7
        );
        assert_eq!(fault_status(&RpcError::Fault(5)), 5);
        assert_eq!(fault_status(&RpcError::Timeout), 0x1c00_0000);
    }

    #[test]
    fn test_server_stats() {
        let stats = ServerStats::default();
        stats.connections_accepted.fetch_add(100, Ordering::Relaxed);
        stats.requests_processed.fetch_add(1000, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connections_accepted, 100);
        assert_eq!(snapshot.requests_processed, 1000);
        assert_eq!(snapshot.requests_failed, 0);
    }

    #[tokio::test]
    async fn test_object_routing_prefers_exact_match() {
        let server = DceRpcServer::new();
        let iface = syntax("c3fac344-1e84-11d1-9bd6-00c04fb683fa", 0);
        let object = Uuid::parse("00000001-0002-0003-0405-060708090a0b").unwrap();
        server.register(iface, None, Arc::new(Tagged(b"any"))).await;
        server.register(iface, Some(object), Arc::new(Tagged(b"exact"))).await;

        let mut conn = test_connection(Arc::clone(&server.registry));
        conn.contexts.insert(0, iface.uuid);

        let exact = conn.dispatch(0, Call::new(7, Bytes::new()).with_object(object)).await;
        assert_eq!(exact.unwrap().as_ref(), b"exact");

        let other = Uuid::parse("ffffffff-0002-0003-0405-060708090a0b").unwrap();
        let fallback = conn.dispatch(0, Call::new(7, Bytes::new()).with_object(other)).await;
        assert_eq!(fallback.unwrap().as_ref(), b"any");

        assert_eq!(
            conn.dispatch(3, Call::new(7, Bytes::new())).await.unwrap_err(),
            FaultStatus::ContextMismatch as u32
        );
    }

    #[tokio::test]
    async fn test_unknown_object_without_fallback() {
        let server = DceRpcServer::new();
        let iface = syntax("e8fb8620-588f-11d2-9d61-00c04f79c5fe", 0);
        let object = Uuid::parse("00000001-0002-0003-0405-060708090a0b").unwrap();
        server.register(iface, Some(object), Arc::new(Tagged(b"x"))).await;

        let mut conn = test_connection(Arc::clone(&server.registry));
        conn.contexts.insert(1, iface.uuid);
        let result = conn.dispatch(1, Call::new(7, Bytes::new())).await;
        assert_eq!(result.unwrap_err(), FaultStatus::UnkIf as u32);

        assert!(server.unregister_object(&iface.uuid, &object).await);
        assert!(!server.unregister_object(&iface.uuid, &object).await);
    }

    #[tokio::test]
    async fn test_negotiate_mixed_contexts() {
        let server = DceRpcServer::new();
        let known = syntax("00000131-0000-0000-c000-000000000046", 0);
        server.register(known, None, Arc::new(Tagged(b""))).await;

        let mut conn = test_connection(Arc::clone(&server.registry));
        conn.assoc_group_id = 1;
        let bind = BindPdu::with_contexts(
            PacketType::AlterContext,
            4,
            vec![
                ContextElement::new(0, known, NDR_SYNTAX),
                ContextElement::new(1, syntax("11111111-0000-0000-c000-000000000046", 0), NDR_SYNTAX),
                ContextElement::new(2, syntax("00000131-0000-0000-c000-000000000046", 1), NDR_SYNTAX),
            ],
        );
        let ack = conn.negotiate(&bind, PacketType::AlterContextResp).await;
        let results: Vec<_> = ack.results.iter().map(|r| (r.result, r.reason)).collect();
        assert_eq!(
            results,
            vec![
                (ContextResult::Acceptance, 0),
                (ContextResult::ProviderRejection, 1),
                (ContextResult::ProviderRejection, 1),
            ]
        );
        assert_eq!(conn.contexts.len(), 1);
        assert_eq!(ack.header.packet_type, PacketType::AlterContextResp);
    }

    fn first_fragment(call_id: u32, len: usize) -> RequestPdu {
        let mut request = RequestPdu::new(call_id, 0, Bytes::from(vec![0u8; len]));
        let mut flags = crate::dcerpc::PacketFlags::new();
        flags.set_first_frag();
        request.header.packet_flags = flags;
        request
    }

    fn fault_of(replies: &[Bytes]) -> u32 {
        match Pdu::decode(&replies[0]).unwrap() {
            Pdu::Fault(fault) => fault.status,
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_calls_are_capped() {
        let mut conn = test_connection(Registry::default());
        for call_id in 1..=DEFAULT_MAX_PENDING_CALLS as u32 {
            let replies = conn.process_request(first_fragment(call_id, 8)).await.unwrap();
            assert!(replies.is_empty());
        }
        assert_eq!(conn.pending.len(), DEFAULT_MAX_PENDING_CALLS);

        let replies = conn.process_request(first_fragment(1000, 8)).await.unwrap();
        assert_eq!(fault_of(&replies), FaultStatus::ProtoError as u32);
        assert_eq!(conn.pending.len(), DEFAULT_MAX_PENDING_CALLS);

        // calls already in flight may still grow
        let mut more = RequestPdu::new(1, 0, Bytes::from(vec![1u8; 8]));
        more.header.packet_flags = crate::dcerpc::PacketFlags::new();
        assert!(conn.process_request(more).await.unwrap().is_empty());
        assert_eq!(conn.pending[&1].assembler.buffered(), 16);
    }

    #[tokio::test]
    async fn test_pending_bytes_are_capped_across_calls() {
        let mut conn = test_connection(Registry::default());
        conn.config.max_call_size = 1000;
        assert!(conn.process_request(first_fragment(1, 600)).await.unwrap().is_empty());

        // fits on its own, not alongside call 1
        let replies = conn.process_request(first_fragment(2, 600)).await.unwrap();
        assert_eq!(fault_of(&replies), FaultStatus::ProtoError as u32);
        assert!(!conn.pending.contains_key(&2));
        assert!(conn.pending.contains_key(&1));
        assert_eq!(conn.stats.requests_failed.load(Ordering::Relaxed), 1);
    }
}
