//! IDispatch client

use super::protocol::*;
use dcom::invoke_orpc;
use dcom::types::{Ipid, Result};
use dcerpc::{CallOptions, Conn, DceRpcClient};
use std::sync::Arc;

/// Client for IDispatch.
///
/// Derived automation interfaces hand out one of these through their
/// `dispatch()` accessor.
#[derive(Clone)]
pub struct DispatchClient {
    conn: Arc<dyn Conn>,
    ipid: Option<Ipid>,
}

impl DispatchClient {
    pub async fn new(client: &Arc<DceRpcClient>) -> Result<Self> {
        let conn = client.bind_interface(DISPATCH_SYNTAX_V0_0).await?;
        Ok(Self::from_conn(Arc::new(conn)))
    }

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

    pub(crate) fn with_parts(conn: Arc<dyn Conn>, ipid: Option<Ipid>) -> Self {
        Self { conn, ipid }
    }

    pub fn conn(&self) -> &Arc<dyn Conn> {
        &self.conn
    }

    pub async fn get_type_info_count(
        &self,
        req: &GetTypeInfoCountRequest,
        opts: &CallOptions,
    ) -> Result<GetTypeInfoCountResponse> {
        invoke_orpc::<GetTypeInfoCountOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn get_type_info(&self, req: &GetTypeInfoRequest, opts: &CallOptions) -> Result<GetTypeInfoResponse> {
        invoke_orpc::<GetTypeInfoOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn get_ids_of_names(
        &self,
        req: &GetIdsOfNamesRequest,
        opts: &CallOptions,
    ) -> Result<GetIdsOfNamesResponse> {
        invoke_orpc::<GetIdsOfNamesOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn invoke(&self, req: &InvokeRequest, opts: &CallOptions) -> Result<InvokeResponse> {
        invoke_orpc::<InvokeOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }
}
