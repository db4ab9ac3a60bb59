//! Fragment framing over a byte stream
//!
//! A connection-oriented PDU carries its own length in `frag_length`, so
//! the stream needs no extra framing: read the 16-byte common header, then
//! the rest of the fragment.

use crate::dcerpc::{Pdu, PduHeader};
use crate::error::{Result, RpcError};
use bytes::{Bytes, BytesMut};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Largest fragment accepted off the wire; frag_length is a u16.
pub const DEFAULT_MAX_PDU_SIZE: usize = 65535;

/// One direction (or both) of a PDU stream.
pub struct DceRpcTransport<T> {
    io: T,
    max_pdu_size: usize,
}

impl<T> DceRpcTransport<T> {
    pub fn new(io: T) -> Self {
        Self {
            io,
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
        }
    }

    /// Reject fragments longer than `max` bytes before reading their body.
    pub fn with_max_pdu_size(self, max: usize) -> Self {
        Self {
            max_pdu_size: max,
            ..self
        }
    }
}

impl<T: AsyncRead + Unpin> DceRpcTransport<T> {
    /// Next fragment, header included.
    ///
    /// A peer closing before the first header byte yields
    /// [`RpcError::ConnectionClosed`]; closing inside a fragment is an
    /// `UnexpectedEof` I/O error.
    pub async fn read_pdu(&mut self) -> Result<Bytes> {
        let mut header = [0u8; PduHeader::SIZE];
        let first = self.io.read(&mut header).await?;
        if first == 0 {
            return Err(RpcError::ConnectionClosed);
        }
        self.io.read_exact(&mut header[first..]).await?;

        let frag_length = usize::from(PduHeader::decode(&header)?.frag_length);
        if frag_length < PduHeader::SIZE {
            return Err(RpcError::InvalidPduData(format!("frag_length {frag_length} below header size")));
        }
        if frag_length > self.max_pdu_size {
            return Err(RpcError::RecordTooLarge {
                size: frag_length,
                max: self.max_pdu_size,
            });
        }

        let mut frag = BytesMut::zeroed(frag_length);
        frag[..PduHeader::SIZE].copy_from_slice(&header);
        self.io
            .read_exact(&mut frag[PduHeader::SIZE..])
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => RpcError::Io(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("stream ended inside a {frag_length} byte fragment"),
                )),
                _ => RpcError::Io(e),
            })?;
        trace!(frag_length, "read fragment");
        Ok(frag.freeze())
    }

    pub async fn read_pdu_decoded(&mut self) -> Result<Pdu> {
        Pdu::decode(&self.read_pdu().await?)
    }
}

impl<T: AsyncWrite + Unpin> DceRpcTransport<T> {
    /// Send one encoded fragment.
    pub async fn write_pdu(&mut self, frag: &[u8]) -> Result<()> {
        self.io.write_all(frag).await?;
        self.io.flush().await?;
        Ok(())
    }
}
