//! IRemUnknown client

use super::protocol::*;
use crate::call::invoke_orpc;
use crate::types::{Ipid, Result};
use dcerpc::{CallOptions, Conn, DceRpcClient};
use std::sync::Arc;

/// Client for IRemUnknown, the remote reference counting interface.
///
/// Calls are addressed to the IRemUnknown IPID of an object exporter,
/// normally the one returned by `ResolveOxid`.
#[derive(Clone)]
pub struct RemUnknownClient {
    conn: Arc<dyn Conn>,
    ipid: Option<Ipid>,
}

impl RemUnknownClient {
    /// Bind IRemUnknown on an existing association.
    pub async fn new(client: &Arc<DceRpcClient>) -> Result<Self> {
        let conn = client.bind_interface(REMUNKNOWN_SYNTAX_V0_0).await?;
        Ok(Self::from_conn(Arc::new(conn)))
    }

    /// Wrap an already bound connection.
    pub fn from_conn(conn: Arc<dyn Conn>) -> Self {
        Self { conn, ipid: None }
    }

    /// A client sharing this connection and addressing `ipid`.
    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self {
            conn: self.conn.clone(),
            ipid: Some(ipid),
        }
    }

    pub fn conn(&self) -> &Arc<dyn Conn> {
        &self.conn
    }

    pub async fn rem_query_interface(
        &self,
        req: &RemQueryInterfaceRequest,
        opts: &CallOptions,
    ) -> Result<RemQueryInterfaceResponse> {
        invoke_orpc::<RemQueryInterfaceOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn rem_add_ref(&self, req: &RemAddRefRequest, opts: &CallOptions) -> Result<RemAddRefResponse> {
        invoke_orpc::<RemAddRefOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn rem_release(&self, req: &RemReleaseRequest, opts: &CallOptions) -> Result<RemReleaseResponse> {
        invoke_orpc::<RemReleaseOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }
}
