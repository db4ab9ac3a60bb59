//! ICertView client

use super::protocol::*;
use crate::oaut::idispatch::DispatchClient;
use dcom::invoke_orpc;
use dcom::types::{Ipid, Result};
use dcerpc::{CallOptions, Conn, DceRpcClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct CertViewClient {
    conn: Arc<dyn Conn>,
    ipid: Option<Ipid>,
}

impl CertViewClient {
    pub async fn new(client: &Arc<DceRpcClient>) -> Result<Self> {
        let conn = client.bind_interface(CERT_VIEW_SYNTAX_V0_0).await?;
        Ok(Self::from_conn(Arc::new(conn)))
    }

    pub fn from_conn(conn: Arc<dyn Conn>) -> Self {
        Self { conn, ipid: None }
    }

    /// A client sharing this connection and addressing `ipid`, for the
    /// IDispatch methods as well.
    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self {
            conn: self.conn.clone(),
            ipid: Some(ipid),
        }
    }

    pub fn conn(&self) -> &Arc<dyn Conn> {
        &self.conn
    }

    /// The IDispatch methods of the same object.
    pub fn dispatch(&self) -> DispatchClient {
        DispatchClient::with_parts(self.conn.clone(), self.ipid)
    }

    pub async fn open_connection(
        &self,
        req: &OpenConnectionRequest,
        opts: &CallOptions,
    ) -> Result<OpenConnectionResponse> {
        invoke_orpc::<OpenConnectionOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn enum_cert_view_column(
        &self,
        req: &EnumCertViewColumnRequest,
        opts: &CallOptions,
    ) -> Result<EnumCertViewColumnResponse> {
        invoke_orpc::<EnumCertViewColumnOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn get_column_count(
        &self,
        req: &GetColumnCountRequest,
        opts: &CallOptions,
    ) -> Result<GetColumnCountResponse> {
        invoke_orpc::<GetColumnCountOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn get_column_index(
        &self,
        req: &GetColumnIndexRequest,
        opts: &CallOptions,
    ) -> Result<GetColumnIndexResponse> {
        invoke_orpc::<GetColumnIndexOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn set_result_column_count(
        &self,
        req: &SetResultColumnCountRequest,
        opts: &CallOptions,
    ) -> Result<SetResultColumnCountResponse> {
        invoke_orpc::<SetResultColumnCountOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn set_result_column(
        &self,
        req: &SetResultColumnRequest,
        opts: &CallOptions,
    ) -> Result<SetResultColumnResponse> {
        invoke_orpc::<SetResultColumnOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn set_restriction(
        &self,
        req: &SetRestrictionRequest,
        opts: &CallOptions,
    ) -> Result<SetRestrictionResponse> {
        invoke_orpc::<SetRestrictionOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }

    pub async fn open_view(&self, req: &OpenViewRequest, opts: &CallOptions) -> Result<OpenViewResponse> {
        invoke_orpc::<OpenViewOp>(self.conn.as_ref(), self.ipid, req, opts).await
    }
}
