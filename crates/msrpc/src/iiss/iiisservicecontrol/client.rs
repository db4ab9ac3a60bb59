//! IIisServiceControl client

use super::protocol::*;
use crate::oaut::idispatch::DispatchClient;
use dcom::invoke_orpc;
use dcom::types::{Ipid, Result};
use dcerpc::{CallOptions, Conn, DceRpcClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct IisServiceControlClient {
    conn: Arc<dyn Conn>,
    ipid: Option<Ipid>,
}

impl IisServiceControlClient {
    pub async fn new(client: &Arc<DceRpcClient>) -> Result<Self> {
        let conn = client.bind_interface(IIS_SERVICE_CONTROL_SYNTAX_V0_0).await?;
        Ok(Self::from_conn(Arc::new(conn)))
    }

    pub fn from_conn(conn: Arc<dyn Conn>) -> Self {
        Self { conn, ipid: None }
    }

    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self {
            conn: self.conn.clone(),
            ipid: Some(ipid),
        }
    }

    pub fn conn(&self) -> &Arc<dyn Conn> {
        &self.conn
    }

    pub fn dispatch(&self) -> DispatchClient {
        DispatchClient::with_parts(self.conn.clone(), self.ipid)
    }

    pub async fn stop(&self, req: &StopRequest, opts: &CallOptions) -> Result<StopResponse> {
        invoke_orpc::<StopOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn start(&self, req: &StartRequest, opts: &CallOptions) -> Result<StartResponse> {
        invoke_orpc::<StartOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn reboot(&self, req: &RebootRequest, opts: &CallOptions) -> Result<RebootResponse> {
        invoke_orpc::<RebootOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    /// Query service status; the returned buffer has `req.buffer_size` bytes.
    pub async fn status(&self, req: &StatusRequest, opts: &CallOptions) -> Result<StatusResponse> {
        invoke_orpc::<StatusOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn kill(&self, req: &KillRequest, opts: &CallOptions) -> Result<KillResponse> {
        invoke_orpc::<KillOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }
}
