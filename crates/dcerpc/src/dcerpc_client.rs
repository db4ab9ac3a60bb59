//! DCE RPC Client
//!
//! One [`DceRpcClient`] owns one TCP association. The first interface is
//! bound with BIND; every further interface is added to the same
//! association with ALTER_CONTEXT and gets its own presentation context.
//! A [`BoundConn`] pairs the association with one of those contexts and is
//! what interface stubs call through.

use crate::binding::StringBinding;
use crate::dcerpc::{
    BindAckPdu, BindPdu, ContextElement, ContextResult, PacketType, Pdu, RequestPdu, SyntaxId,
    Uuid, DEFAULT_MAX_FRAG, MUST_RECV_FRAG_SIZE, NDR_SYNTAX,
};
use crate::dcerpc_transport::{DceRpcTransport, DEFAULT_MAX_PDU_SIZE};
use crate::error::{Result, RpcError};
use crate::fragmentation::{FragmentAssembler, FragmentGenerator};
use crate::operation::{CallOptions, Conn, Reply};
use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Negotiated state of the association.
#[derive(Debug)]
struct Association {
    established: bool,
    assoc_group_id: u32,
    max_xmit_frag: u16,
    max_recv_frag: u16,
    next_context_id: u16,
    contexts: Vec<(SyntaxId, u16)>,
}

impl Association {
    fn new(max_frag: u16) -> Self {
        Self {
            established: false,
            assoc_group_id: 0,
            max_xmit_frag: max_frag,
            max_recv_frag: max_frag,
            next_context_id: 0,
            contexts: Vec::new(),
        }
    }

    fn context_for(&self, syntax: &SyntaxId) -> Option<u16> {
        self.contexts
            .iter()
            .find(|(bound, _)| bound == syntax)
            .map(|(_, id)| *id)
    }
}

/// DCE RPC client association over TCP
pub struct DceRpcClient {
    read_transport: Mutex<DceRpcTransport<ReadHalf<TcpStream>>>,
    write_transport: Mutex<DceRpcTransport<WriteHalf<TcpStream>>>,
    call_id_counter: AtomicU32,
    assoc: parking_lot::Mutex<Association>,
    timeout: Option<Duration>,
    /// Set once a call is abandoned mid-exchange; the stream may then hold
    /// a partial request or an unread reply.
    abandoned: AtomicBool,
}

impl DceRpcClient {
    /// Connect and bind `interface` as presentation context 0.
    pub async fn connect(addr: SocketAddr, interface: SyntaxId) -> Result<Self> {
        let client = Self::dial(addr).await?;
        client.bind(interface).await?;
        Ok(client)
    }

    /// Connect without binding any interface.
    pub async fn dial(addr: SocketAddr) -> Result<Self> {
        DceRpcClientBuilder::new().dial(addr).await
    }

    /// Wrap an already connected stream (unbound).
    pub fn from_stream(stream: TcpStream) -> Self {
        Self::from_parts(stream, DEFAULT_MAX_PDU_SIZE, DEFAULT_MAX_FRAG, None)
    }

    fn from_parts(stream: TcpStream, max_pdu_size: usize, max_frag: u16, timeout: Option<Duration>) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            read_transport: Mutex::new(DceRpcTransport::new(reader).with_max_pdu_size(max_pdu_size)),
            write_transport: Mutex::new(DceRpcTransport::new(writer)),
            call_id_counter: AtomicU32::new(1),
            assoc: parking_lot::Mutex::new(Association::new(max_frag)),
            timeout,
            abandoned: AtomicBool::new(false),
        }
    }

    fn next_call_id(&self) -> u32 {
        self.call_id_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.abandoned.load(Ordering::SeqCst) {
            return Err(RpcError::ConnectionClosed);
        }
        Ok(())
    }

    /// False once a timed out call has left the stream out of step.
    pub fn is_usable(&self) -> bool {
        !self.abandoned.load(Ordering::SeqCst)
    }

    /// Bind `syntax` on this association and return its context id.
    ///
    /// An interface that is already bound keeps its context.
    pub async fn bind(&self, syntax: SyntaxId) -> Result<u16> {
        // Holding the read half keeps binds and calls from interleaving.
        let mut read = self.read_transport.lock().await;
        self.ensure_usable()?;

        let (packet_type, context_id, max_frag, assoc_group_id) = {
            let assoc = self.assoc.lock();
            if let Some(id) = assoc.context_for(&syntax) {
                return Ok(id);
            }
            let packet_type = if assoc.established {
                PacketType::AlterContext
            } else {
                PacketType::Bind
            };
            (packet_type, assoc.next_context_id, assoc.max_recv_frag, assoc.assoc_group_id)
        };

        let call_id = self.next_call_id();
        let mut bind = BindPdu::with_contexts(
            packet_type,
            call_id,
            vec![ContextElement::new(context_id, syntax, NDR_SYNTAX)],
        );
        bind.max_xmit_frag = max_frag;
        bind.max_recv_frag = max_frag;
        bind.assoc_group_id = assoc_group_id;

        debug!(
            "Sending {:?}: call_id={}, context_id={}, interface={}",
            packet_type, call_id, context_id, syntax
        );
        {
            let mut write = self.write_transport.lock().await;
            write.write_pdu(&bind.encode()?).await?;
        }

        let ack = loop {
            match read.read_pdu_decoded().await? {
                Pdu::BindAck(ack) | Pdu::AlterContextResp(ack) if ack.header.call_id == call_id => {
                    break ack
                }
                Pdu::BindNak(nak) => {
                    return Err(RpcError::BindFailed(format!(
                        "bind_nak, reason {}",
                        nak.reject_reason
                    )))
                }
                Pdu::Fault(fault) if fault.header.call_id == call_id => {
                    return Err(RpcError::Fault(fault.status))
                }
                other if other.call_id() < call_id => {
                    trace!("Discarding stale PDU for call_id={}", other.call_id());
                }
                other => {
                    return Err(RpcError::XidMismatch {
                        expected: call_id,
                        got: other.call_id(),
                    })
                }
            }
        };

        self.accept_ack(&ack, syntax, context_id)
    }

    fn accept_ack(&self, ack: &BindAckPdu, syntax: SyntaxId, context_id: u16) -> Result<u16> {
        let mut assoc = self.assoc.lock();
        if !assoc.established {
            assoc.established = true;
            assoc.assoc_group_id = ack.assoc_group_id;
            // The server's receive size bounds what we may transmit.
            assoc.max_xmit_frag = ack.max_recv_frag.max(MUST_RECV_FRAG_SIZE).min(assoc.max_xmit_frag);
            assoc.max_recv_frag = ack.max_xmit_frag.max(MUST_RECV_FRAG_SIZE).min(assoc.max_recv_frag);
        }
        assoc.next_context_id = context_id + 1;

        let result = ack
            .results
            .first()
            .ok_or_else(|| RpcError::BindFailed("empty presentation result list".to_string()))?;
        if result.result != ContextResult::Acceptance {
            warn!(
                "Presentation context {} for {} rejected: reason {}",
                context_id, syntax, result.reason
            );
            return Err(RpcError::BindRejected {
                result: result.result as u16,
                reason: result.reason,
            });
        }

        assoc.contexts.push((syntax, context_id));
        debug!(
            "Bound {} as context {}: max_xmit={}, max_recv={}",
            syntax, context_id, assoc.max_xmit_frag, assoc.max_recv_frag
        );
        Ok(context_id)
    }

    /// Bind `syntax` and return a connection for its context.
    pub async fn bind_interface(self: &Arc<Self>, syntax: SyntaxId) -> Result<BoundConn> {
        let context_id = self.bind(syntax).await?;
        Ok(BoundConn {
            client: Arc::clone(self),
            context_id,
        })
    }

    /// Call `opnum` on the first bound context.
    pub async fn call(&self, opnum: u16, stub_data: Bytes) -> Result<Bytes> {
        let context_id = self
            .assoc
            .lock()
            .contexts
            .first()
            .map(|(_, id)| *id)
            .ok_or_else(|| RpcError::CallRejected("not bound".to_string()))?;
        self.call_with(context_id, opnum, None, stub_data).await
    }

    /// Call `opnum` on `context_id`, optionally addressed to `object`.
    ///
    /// Requests larger than the negotiated fragment size are split and
    /// fragmented responses are reassembled.
    pub async fn call_with(
        &self,
        context_id: u16,
        opnum: u16,
        object: Option<Uuid>,
        stub_data: Bytes,
    ) -> Result<Bytes> {
        Ok(self.call_reply(context_id, opnum, object, stub_data, None).await?.stub)
    }

    /// [`call_with`](Self::call_with), also returning the response's data
    /// representation. `timeout` overrides the builder's limit for this call.
    ///
    /// A call that times out may have sent part of its request or left its
    /// reply unread, so the association is given up: this and every later
    /// call or bind fails without touching the stream.
    pub async fn call_reply(
        &self,
        context_id: u16,
        opnum: u16,
        object: Option<Uuid>,
        stub_data: Bytes,
        timeout: Option<Duration>,
    ) -> Result<Reply> {
        self.ensure_usable()?;
        let exchange = self.exchange(context_id, opnum, object, stub_data);
        match timeout.or(self.timeout) {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    self.abandoned.store(true, Ordering::SeqCst);
                    warn!(
                        "Call to opnum {} timed out after {:?}; abandoning the association",
                        opnum, limit
                    );
                    Err(RpcError::Timeout)
                }
            },
            None => exchange.await,
        }
    }

    async fn exchange(
        &self,
        context_id: u16,
        opnum: u16,
        object: Option<Uuid>,
        stub_data: Bytes,
    ) -> Result<Reply> {
        let mut read = self.read_transport.lock().await;
        self.ensure_usable()?;

        let max_xmit_frag = {
            let assoc = self.assoc.lock();
            if !assoc.contexts.iter().any(|(_, id)| *id == context_id) {
                return Err(RpcError::ContextMismatch(context_id));
            }
            assoc.max_xmit_frag
        };

        let call_id = self.next_call_id();
        let mut request = RequestPdu::new(call_id, opnum, stub_data);
        request.context_id = context_id;
        request.object_uuid = object;

        let fragments = FragmentGenerator::fragment_request(&request, max_xmit_frag);
        debug!(
            "Sending request: call_id={}, context_id={}, opnum={}, stub_len={}, fragments={}",
            call_id,
            context_id,
            opnum,
            request.stub_data.len(),
            fragments.len()
        );
        {
            let mut write = self.write_transport.lock().await;
            for frag in &fragments {
                write.write_pdu(&frag.encode()?).await?;
            }
        }

        let mut assembler = FragmentAssembler::new(call_id);
        let mut data_rep = None;
        loop {
            match read.read_pdu_decoded().await? {
                Pdu::Response(response) if response.header.call_id == call_id => {
                    let flags = response.header.packet_flags;
                    if flags.is_first_frag() && flags.is_last_frag() {
                        trace!("Call {} returned {} bytes", call_id, response.stub_data.len());
                        return Ok(Reply {
                            stub: response.stub_data,
                            data_rep: response.header.data_rep,
                        });
                    }
                    // The first fragment's label covers the whole stub.
                    let data_rep = *data_rep.get_or_insert(response.header.data_rep);
                    if let Some(stub) = assembler.add_fragment(
                        &response.header,
                        &response.stub_data,
                        response.context_id,
                        None,
                        response.alloc_hint,
                    )? {
                        trace!("Reassembled response for call {}: {} bytes", call_id, stub.len());
                        return Ok(Reply { stub, data_rep });
                    }
                }
                Pdu::Fault(fault) if fault.header.call_id == call_id => {
                    debug!("Call {} faulted: status=0x{:08x}", call_id, fault.status);
                    return Err(RpcError::Fault(fault.status));
                }
                other if other.call_id() < call_id => {
                    // Late reply to a call that already timed out.
                    trace!("Discarding stale PDU for call_id={}", other.call_id());
                }
                other => {
                    return Err(RpcError::XidMismatch {
                        expected: call_id,
                        got: other.call_id(),
                    })
                }
            }
        }
    }

    /// Context ids bound so far, in binding order.
    pub fn bound_contexts(&self) -> Vec<(SyntaxId, u16)> {
        self.assoc.lock().contexts.clone()
    }

    pub fn is_bound(&self) -> bool {
        !self.assoc.lock().contexts.is_empty()
    }

    /// Negotiated (transmit, receive) fragment sizes.
    pub fn max_frag(&self) -> (u16, u16) {
        let assoc = self.assoc.lock();
        (assoc.max_xmit_frag, assoc.max_recv_frag)
    }
}

/// A presentation context on a shared association.
#[derive(Clone)]
pub struct BoundConn {
    client: Arc<DceRpcClient>,
    context_id: u16,
}

impl BoundConn {
    pub fn client(&self) -> &Arc<DceRpcClient> {
        &self.client
    }

    pub fn context_id(&self) -> u16 {
        self.context_id
    }
}

impl std::fmt::Debug for BoundConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundConn")
            .field("context_id", &self.context_id)
            .finish()
    }
}

#[async_trait]
impl Conn for BoundConn {
    async fn invoke_raw(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Bytes> {
        Ok(self.invoke_reply(opnum, stub, opts).await?.stub)
    }

    async fn invoke_reply(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Reply> {
        self.client
            .call_reply(self.context_id, opnum, opts.object, stub, opts.timeout)
            .await
    }
}

/// Builder for DCE RPC clients
#[derive(Debug, Clone)]
pub struct DceRpcClientBuilder {
    timeout: Option<Duration>,
    max_pdu_size: usize,
    max_frag: u16,
}

impl DceRpcClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
            max_frag: DEFAULT_MAX_FRAG,
        }
    }

    /// Limit for connecting and for every call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_pdu_size(mut self, size: usize) -> Self {
        self.max_pdu_size = size;
        self
    }

    /// Fragment size proposed in BIND, never below 1432.
    pub fn max_frag(mut self, size: u16) -> Self {
        self.max_frag = size.max(MUST_RECV_FRAG_SIZE);
        self
    }

    pub async fn dial(self, addr: SocketAddr) -> Result<DceRpcClient> {
        let stream = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(addr))
                .await
                .map_err(|_| RpcError::Timeout)??,
            None => TcpStream::connect(addr).await?,
        };
        stream.set_nodelay(true)?;
        debug!("Connected to {}", addr);
        Ok(DceRpcClient::from_parts(
            stream,
            self.max_pdu_size.max(self.max_frag as usize),
            self.max_frag,
            self.timeout,
        ))
    }

    /// Dial the `ncacn_ip_tcp` endpoint a string binding names.
    pub async fn dial_binding(self, binding: &StringBinding) -> Result<DceRpcClient> {
        let addr = binding.socket_addr().await?;
        debug!("Binding {} resolved to {}", binding, addr);
        self.dial(addr).await
    }

    /// Connect and bind `interface` as context 0.
    pub async fn connect(self, addr: SocketAddr, interface: SyntaxId) -> Result<DceRpcClient> {
        let client = self.dial(addr).await?;
        client.bind(interface).await?;
        Ok(client)
    }
}

impl Default for DceRpcClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcerpc::{reject_reason, DataRepresentation, PresentationResult, ResponsePdu};

    #[test]
    fn test_client_builder() {
        let builder = DceRpcClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .max_pdu_size(1024 * 1024)
            .max_frag(512);

        assert_eq!(builder.timeout, Some(Duration::from_secs(30)));
        assert_eq!(builder.max_pdu_size, 1024 * 1024);
        assert_eq!(builder.max_frag, MUST_RECV_FRAG_SIZE);
    }

    #[test]
    fn test_association_context_lookup() {
        let a = SyntaxId::new(Uuid::parse("00000131-0000-0000-c000-000000000046").unwrap(), 0, 0);
        let b = SyntaxId::new(Uuid::parse("00020400-0000-0000-c000-000000000046").unwrap(), 0, 0);
        let mut assoc = Association::new(DEFAULT_MAX_FRAG);
        assoc.contexts.push((a, 0));
        assert_eq!(assoc.context_for(&a), Some(0));
        assert_eq!(assoc.context_for(&b), None);
    }

    #[tokio::test]
    async fn test_rejected_context_is_not_recorded() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = DceRpcTransport::new(stream);
            let bind = match transport.read_pdu_decoded().await.unwrap() {
                Pdu::Bind(bind) => bind,
                other => panic!("expected bind, got {:?}", other),
            };
            let ack = BindAckPdu::new(
                PacketType::BindAck,
                bind.header.call_id,
                7,
                vec![PresentationResult::rejected(reject_reason::ABSTRACT_SYNTAX_NOT_SUPPORTED)],
            );
            transport.write_pdu(&ack.encode().unwrap()).await.unwrap();
        });

        let client = DceRpcClient::dial(addr).await.unwrap();
        let syntax = SyntaxId::new(Uuid::parse("12345678-1234-1234-1234-123456789012").unwrap(), 1, 0);
        let result = client.bind(syntax).await;
        assert!(matches!(
            result,
            Err(RpcError::BindRejected { result: 2, reason: 1 })
        ));
        assert!(!client.is_bound());
        assert!(matches!(
            client.call(0, Bytes::new()).await,
            Err(RpcError::CallRejected(_))
        ));
        server.await.unwrap();
    }

    /// Accept one bind on `transport` and return the next request.
    async fn accept_and_read_request(transport: &mut DceRpcTransport<TcpStream>) -> RequestPdu {
        let bind = match transport.read_pdu_decoded().await.unwrap() {
            Pdu::Bind(bind) => bind,
            other => panic!("expected bind, got {:?}", other),
        };
        let ack = BindAckPdu::new(
            PacketType::BindAck,
            bind.header.call_id,
            1,
            vec![PresentationResult::accepted(NDR_SYNTAX)],
        );
        transport.write_pdu(&ack.encode().unwrap()).await.unwrap();
        match transport.read_pdu_decoded().await.unwrap() {
            Pdu::Request(req) => req,
            other => panic!("expected request, got {:?}", other),
        }
    }

    fn test_syntax() -> SyntaxId {
        SyntaxId::new(Uuid::parse("12345678-1234-1234-1234-123456789012").unwrap(), 1, 0)
    }

    #[tokio::test]
    async fn test_stale_reply_is_skipped() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = DceRpcTransport::new(stream);
            let req = accept_and_read_request(&mut transport).await;
            // a late answer to an earlier call arrives first
            let stale = ResponsePdu::new(req.header.call_id - 1, Bytes::from_static(b"old"));
            transport.write_pdu(&stale.encode().unwrap()).await.unwrap();
            let fresh = ResponsePdu::new(req.header.call_id, Bytes::from_static(b"new"));
            transport.write_pdu(&fresh.encode().unwrap()).await.unwrap();
        });

        let client = DceRpcClient::connect(addr, test_syntax()).await.unwrap();
        let reply = client.call(0, Bytes::from_static(b"ask")).await.unwrap();
        assert_eq!(reply.as_ref(), b"new");
        assert!(client.is_usable());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_abandons_association() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = DceRpcTransport::new(stream);
            let req = accept_and_read_request(&mut transport).await;
            tokio::time::sleep(Duration::from_millis(300)).await;
            // the reply nobody is waiting for any more
            let late = ResponsePdu::new(req.header.call_id, Bytes::from_static(b"late"));
            let _ = transport.write_pdu(&late.encode().unwrap()).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = DceRpcClientBuilder::new()
            .timeout(Duration::from_millis(100))
            .connect(addr, test_syntax())
            .await
            .unwrap();
        assert!(matches!(client.call(0, Bytes::new()).await, Err(RpcError::Timeout)));
        assert!(!client.is_usable());

        // even after the late reply has landed, nothing reads it as an answer
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(matches!(
            client.call(0, Bytes::new()).await,
            Err(RpcError::ConnectionClosed)
        ));
        let other = SyntaxId::new(Uuid::parse("00000131-0000-0000-c000-000000000046").unwrap(), 0, 0);
        assert!(matches!(client.bind(other).await, Err(RpcError::ConnectionClosed)));
        server.abort();
    }

    struct ReadValue;

    impl crate::operation::Operation for ReadValue {
        const OPNUM: u16 = 2;
        const NAME: &'static str = "/ITest/v0/ReadValue";
        type Request = u32;
        type Response = u32;
    }

    #[tokio::test]
    async fn test_big_endian_response_decoded_in_its_order() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = DceRpcTransport::new(stream);
            let req = accept_and_read_request(&mut transport).await;
            assert_eq!(req.opnum, 2);
            let mut resp = ResponsePdu::new(req.header.call_id, Bytes::from_static(&[0, 0, 0x01, 0x2c]));
            resp.header.data_rep = DataRepresentation::big_endian();
            transport.write_pdu(&resp.encode().unwrap()).await.unwrap();
        });

        let client = Arc::new(DceRpcClient::dial(addr).await.unwrap());
        let conn = client.bind_interface(test_syntax()).await.unwrap();
        let value = crate::operation::invoke::<ReadValue>(&conn, &7, &CallOptions::default())
            .await
            .unwrap();
        assert_eq!(value, 300);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_dial_binding() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = DceRpcTransport::new(stream);
            let req = accept_and_read_request(&mut transport).await;
            let resp = ResponsePdu::new(req.header.call_id, req.stub_data);
            transport.write_pdu(&resp.encode().unwrap()).await.unwrap();
        });

        let binding = StringBinding::parse(&format!("ncacn_ip_tcp:127.0.0.1[{port},ndr20]")).unwrap();
        let client = DceRpcClientBuilder::new().dial_binding(&binding).await.unwrap();
        client.bind(test_syntax()).await.unwrap();
        let reply = client.call(1, Bytes::from_static(b"echo")).await.unwrap();
        assert_eq!(reply.as_ref(), b"echo");
        server.await.unwrap();

        let pipe = StringBinding::parse(r"ncacn_np:127.0.0.1[\pipe\svcctl]").unwrap();
        assert!(matches!(
            DceRpcClientBuilder::new().dial_binding(&pipe).await,
            Err(RpcError::InvalidBinding(_))
        ));
    }
}
