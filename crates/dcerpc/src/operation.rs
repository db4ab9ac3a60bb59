//! Typed operation invocation
//!
//! Interface stubs describe each IDL method as an [`Operation`]: its opnum,
//! a name used in logs and errors, and the request/response structures that
//! marshal its `[in]` and `[out]` parameters. [`invoke`] turns such a
//! description into one round trip over any [`Conn`].

use crate::dcerpc::{DataRepresentation, Uuid};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};
use std::time::Duration;
use tracing::{debug, trace};

/// Per-call settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Object UUID carried in the REQUEST header; DCOM puts the IPID here.
    pub object: Option<Uuid>,
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: Uuid) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A response stub and the data representation its RESPONSE PDUs declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub stub: Bytes,
    pub data_rep: DataRepresentation,
}

impl Reply {
    /// A stub in the default little-endian representation.
    pub fn ndr(stub: Bytes) -> Self {
        Self {
            stub,
            data_rep: DataRepresentation::ndr(),
        }
    }
}

/// A presentation context that can carry calls.
///
/// Implemented by [`BoundConn`](crate::BoundConn) for TCP associations;
/// tests can implement it over anything that produces response stubs.
#[async_trait]
pub trait Conn: Send + Sync {
    /// Send `stub` as operation `opnum` and return the response stub.
    async fn invoke_raw(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Bytes>;

    /// Like [`invoke_raw`](Conn::invoke_raw), keeping the byte order the
    /// peer used. Connections that only ever see little-endian stubs can
    /// rely on the default.
    async fn invoke_reply(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Reply> {
        Ok(Reply::ndr(self.invoke_raw(opnum, stub, opts).await?))
    }
}

#[async_trait]
impl<C: Conn + ?Sized> Conn for std::sync::Arc<C> {
    async fn invoke_raw(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Bytes> {
        (**self).invoke_raw(opnum, stub, opts).await
    }

    async fn invoke_reply(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Reply> {
        (**self).invoke_reply(opnum, stub, opts).await
    }
}

/// One method of an RPC interface.
pub trait Operation {
    const OPNUM: u16;
    /// Fully qualified name, e.g. `/ICertView/v0/OpenConnection`.
    const NAME: &'static str;

    type Request: NdrEncode + NdrDecode + Send + Sync;
    type Response: NdrEncode + NdrDecode + Send + Sync;
}

/// Marshal a top-level value into a fresh stub.
pub fn marshal<T: NdrEncode + ?Sized>(value: &T) -> Result<Bytes> {
    let mut w = NdrWriter::new();
    w.write_param(value)?;
    Ok(w.into_bytes())
}

/// Unmarshal a top-level value from a stub.
///
/// Bytes left over after the value are ignored; servers may append
/// alignment padding.
pub fn unmarshal<T: NdrDecode>(stub: Bytes) -> Result<T> {
    unmarshal_with(stub, DataRepresentation::ndr())
}

/// Unmarshal a stub sent in `data_rep`'s byte order.
pub fn unmarshal_with<T: NdrDecode>(stub: Bytes, data_rep: DataRepresentation) -> Result<T> {
    let mut r = NdrReader::with_context(stub, data_rep.ndr_context());
    let value = r.read_param()?;
    if r.remaining() > 0 {
        trace!(trailing = r.remaining(), "ignoring trailing stub bytes");
    }
    Ok(value)
}

/// Marshal `req`, call `O` over `conn` and unmarshal the response.
pub async fn invoke<O: Operation>(
    conn: &dyn Conn,
    req: &O::Request,
    opts: &CallOptions,
) -> Result<O::Response> {
    let stub = marshal(req)?;
    debug!(op = O::NAME, opnum = O::OPNUM, stub_len = stub.len(), "invoke");
    let reply = conn.invoke_reply(O::OPNUM, stub, opts).await?;
    trace!(op = O::NAME, reply_len = reply.stub.len(), little_endian = reply.data_rep.is_little_endian(), "reply");
    unmarshal_with(reply.stub, reply.data_rep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use parking_lot::Mutex;

    /// Echoes the request stub and records what it was given.
    #[derive(Default)]
    struct LoopbackConn {
        seen: Mutex<Vec<(u16, Option<Uuid>)>>,
    }

    #[async_trait]
    impl Conn for LoopbackConn {
        async fn invoke_raw(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Bytes> {
            self.seen.lock().push((opnum, opts.object));
            if opnum == 99 {
                return Err(RpcError::Fault(0x1c01_0002));
            }
            Ok(stub)
        }
    }

    struct Echo;

    impl Operation for Echo {
        const OPNUM: u16 = 4;
        const NAME: &'static str = "/ITest/v0/Echo";
        type Request = u32;
        type Response = u32;
    }

    struct Broken;

    impl Operation for Broken {
        const OPNUM: u16 = 99;
        const NAME: &'static str = "/ITest/v0/Broken";
        type Request = u32;
        type Response = u32;
    }

    #[tokio::test]
    async fn test_invoke_round_trip() {
        let conn = LoopbackConn::default();
        let object = Uuid::parse("00000000-0000-0000-0000-000000000042").unwrap();
        let opts = CallOptions::new().with_object(object);
        let reply = invoke::<Echo>(&conn, &0xfeed_beef, &opts).await.unwrap();
        assert_eq!(reply, 0xfeed_beef);
        assert_eq!(conn.seen.lock().as_slice(), &[(4, Some(object))]);
    }

    #[tokio::test]
    async fn test_invoke_propagates_fault() {
        let conn = LoopbackConn::default();
        let result = invoke::<Broken>(&conn, &1, &CallOptions::default()).await;
        assert!(matches!(result, Err(RpcError::Fault(0x1c01_0002))));
    }

    /// Answers every call with a big-endian stub.
    struct BigEndianConn;

    #[async_trait]
    impl Conn for BigEndianConn {
        async fn invoke_raw(&self, _opnum: u16, _stub: Bytes, _opts: &CallOptions) -> Result<Bytes> {
            Ok(Bytes::from_static(&[0x01, 0x02, 0x03, 0x04]))
        }

        async fn invoke_reply(&self, opnum: u16, stub: Bytes, opts: &CallOptions) -> Result<Reply> {
            Ok(Reply {
                stub: self.invoke_raw(opnum, stub, opts).await?,
                data_rep: DataRepresentation::big_endian(),
            })
        }
    }

    #[tokio::test]
    async fn test_invoke_honours_reply_byte_order() {
        let reply = invoke::<Echo>(&BigEndianConn, &0, &CallOptions::default()).await.unwrap();
        assert_eq!(reply, 0x0102_0304);

        // the same bytes through the Arc forwarding impl
        let shared = std::sync::Arc::new(BigEndianConn);
        let reply = invoke::<Echo>(&shared, &0, &CallOptions::default()).await.unwrap();
        assert_eq!(reply, 0x0102_0304);
    }

    #[test]
    fn test_unmarshal_short_stub() {
        let result = unmarshal::<u32>(Bytes::from_static(&[1, 2]));
        assert!(matches!(result, Err(RpcError::Ndr(_))));
    }
}
