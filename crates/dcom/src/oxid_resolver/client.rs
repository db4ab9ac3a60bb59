//! IObjectExporter client

use super::protocol::*;
use crate::call::call;
use crate::types::{Result, SetId};
use dcerpc::{CallOptions, Conn, DceRpcClient};
use std::net::SocketAddr;
use std::sync::Arc;

/// Client for the OXID resolver (IObjectExporter), normally on port 135.
#[derive(Clone)]
pub struct ObjectExporterClient {
    conn: Arc<dyn Conn>,
}

impl ObjectExporterClient {
    /// Bind IObjectExporter on an existing association.
    pub async fn new(client: &Arc<DceRpcClient>) -> Result<Self> {
        let conn = client.bind_interface(OBJECT_EXPORTER_SYNTAX_V0_0).await?;
        Ok(Self::from_conn(Arc::new(conn)))
    }

    /// Open an association to `addr` and bind IObjectExporter on it.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let client = Arc::new(DceRpcClient::dial(addr).await?);
        Self::new(&client).await
    }

    pub fn from_conn(conn: Arc<dyn Conn>) -> Self {
        Self { conn }
    }

    pub async fn resolve_oxid(&self, req: &ResolveOxidRequest, opts: &CallOptions) -> Result<ResolveOxidResponse> {
        call::<ResolveOxidOp>(self.conn.as_ref(), req, opts).await
    }

    pub async fn simple_ping(&self, req: &SimplePingRequest, opts: &CallOptions) -> Result<StatusResponse> {
        call::<SimplePingOp>(self.conn.as_ref(), req, opts).await
    }

    pub async fn complex_ping(&self, req: &ComplexPingRequest, opts: &CallOptions) -> Result<ComplexPingResponse> {
        call::<ComplexPingOp>(self.conn.as_ref(), req, opts).await
    }

    pub async fn server_alive(&self, opts: &CallOptions) -> Result<StatusResponse> {
        call::<ServerAliveOp>(self.conn.as_ref(), &EmptyRequest, opts).await
    }

    pub async fn resolve_oxid2(&self, req: &ResolveOxidRequest, opts: &CallOptions) -> Result<ResolveOxid2Response> {
        call::<ResolveOxid2Op>(self.conn.as_ref(), req, opts).await
    }

    pub async fn server_alive2(&self, opts: &CallOptions) -> Result<ServerAlive2Response> {
        call::<ServerAlive2Op>(self.conn.as_ref(), &EmptyRequest, opts).await
    }

    /// Keep a ping set alive.
    pub async fn ping(&self, set_id: SetId) -> Result<()> {
        self.simple_ping(&SimplePingRequest { set_id }, &CallOptions::new())
            .await
            .map(|_| ())
    }
}
