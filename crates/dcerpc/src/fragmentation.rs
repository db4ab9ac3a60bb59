//! Splitting and reassembly of REQUEST and RESPONSE fragments
//!
//! A call whose stub does not fit in one fragment of the negotiated size is
//! sent as a run of fragments sharing a call ID. The first carries
//! `FIRST_FRAG`, the last carries `LAST_FRAG`, and every fragment repeats
//! the body header with `alloc_hint` set to the full stub length.
//!
//! ```text
//! | header 16 | body header 8 | object uuid 16 (optional) | stub chunk |
//! ```

use crate::dcerpc::{PacketFlags, PduHeader, RequestPdu, ResponsePdu};
use crate::error::{Result, RpcError};
use bytes::{Bytes, BytesMut};

/// Most a first fragment's `alloc_hint` may pre-allocate. The hint is
/// peer-supplied, so larger stubs grow as their fragments arrive.
pub const MAX_HINT_RESERVATION: usize = 64 * 1024;

/// Splits outgoing stubs into fragments of a negotiated size.
pub struct FragmentGenerator;

impl FragmentGenerator {
    /// Stub bytes that fit in one fragment of `max_frag` bytes.
    ///
    /// Rounded down to a multiple of 8 so every fragment but the last ends
    /// on NDR alignment. Never returns less than 8 so a misconfigured peer
    /// cannot stall a call with empty fragments.
    pub fn max_stub_size(max_frag: u16, has_object_uuid: bool) -> usize {
        let mut overhead = PduHeader::SIZE + RequestPdu::BODY_HEADER_SIZE;
        if has_object_uuid {
            overhead += 16;
        }
        ((max_frag as usize).saturating_sub(overhead) & !7).max(8)
    }

    fn flags_for(index: usize, count: usize) -> PacketFlags {
        let mut flags = PacketFlags::new();
        if index == 0 {
            flags.set_first_frag();
        }
        if index + 1 == count {
            flags.set_last_frag();
        }
        flags
    }

    fn chunks(stub: &Bytes, max_stub: usize) -> Vec<Bytes> {
        if stub.is_empty() {
            return vec![Bytes::new()];
        }
        (0..stub.len())
            .step_by(max_stub)
            .map(|start| stub.slice(start..(start + max_stub).min(stub.len())))
            .collect()
    }

    pub fn fragment_request(request: &RequestPdu, max_frag: u16) -> Vec<RequestPdu> {
        let max_stub = Self::max_stub_size(max_frag, request.object_uuid.is_some());
        let chunks = Self::chunks(&request.stub_data, max_stub);
        let count = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, stub_data)| {
                let mut header = request.header.clone();
                header.packet_flags = Self::flags_for(i, count);
                RequestPdu {
                    header,
                    alloc_hint: request.stub_data.len() as u32,
                    context_id: request.context_id,
                    opnum: request.opnum,
                    object_uuid: request.object_uuid,
                    stub_data,
                }
            })
            .collect()
    }

    pub fn fragment_response(response: &ResponsePdu, max_frag: u16) -> Vec<ResponsePdu> {
        let max_stub = Self::max_stub_size(max_frag, false);
        let chunks = Self::chunks(&response.stub_data, max_stub);
        let count = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, stub_data)| {
                let mut header = response.header.clone();
                header.packet_flags = Self::flags_for(i, count);
                ResponsePdu {
                    header,
                    alloc_hint: response.stub_data.len() as u32,
                    context_id: response.context_id,
                    cancel_count: response.cancel_count,
                    stub_data,
                }
            })
            .collect()
    }
}

/// Collects the fragments of one call until `LAST_FRAG` arrives.
#[derive(Debug)]
pub struct FragmentAssembler {
    call_id: u32,
    stub_data: BytesMut,
    context_id: u16,
    opnum: Option<u16>,
    received_first: bool,
    received_last: bool,
    max_size: usize,
}

impl FragmentAssembler {
    pub fn new(call_id: u32) -> Self {
        Self::with_limit(call_id, midl_ndr::MAX_NDR_ALLOCATION_SIZE)
    }

    /// Assembler that refuses calls whose stub grows past `max_size`.
    pub fn with_limit(call_id: u32, max_size: usize) -> Self {
        Self {
            call_id,
            stub_data: BytesMut::new(),
            context_id: 0,
            opnum: None,
            received_first: false,
            received_last: false,
            max_size,
        }
    }

    pub fn call_id(&self) -> u32 {
        self.call_id
    }

    pub fn context_id(&self) -> u16 {
        self.context_id
    }

    pub fn opnum(&self) -> Option<u16> {
        self.opnum
    }

    /// Stub bytes collected so far.
    pub fn buffered(&self) -> usize {
        self.stub_data.len()
    }

    pub fn is_complete(&self) -> bool {
        self.received_first && self.received_last
    }

    /// Append one fragment.
    ///
    /// Returns the whole stub once the last fragment is in, `None` while
    /// more are expected.
    pub fn add_fragment(
        &mut self,
        header: &PduHeader,
        stub: &[u8],
        context_id: u16,
        opnum: Option<u16>,
        alloc_hint: u32,
    ) -> Result<Option<Bytes>> {
        if header.call_id != self.call_id {
            return Err(RpcError::XidMismatch {
                expected: self.call_id,
                got: header.call_id,
            });
        }
        if self.received_last {
            return Err(RpcError::FragmentAssemblyError(format!(
                "call {} already complete",
                self.call_id
            )));
        }

        if header.packet_flags.is_first_frag() {
            if self.received_first {
                return Err(RpcError::FragmentAssemblyError(format!(
                    "second first fragment for call {}",
                    self.call_id
                )));
            }
            self.received_first = true;
            self.context_id = context_id;
            self.opnum = opnum;
            let hint = (alloc_hint as usize).min(self.max_size).min(MAX_HINT_RESERVATION);
            self.stub_data.reserve(hint);
        } else if !self.received_first {
            return Err(RpcError::FragmentOutOfOrder(self.call_id));
        }

        if context_id != self.context_id {
            return Err(RpcError::ContextMismatch(context_id));
        }
        if self.stub_data.len() + stub.len() > self.max_size {
            return Err(RpcError::RecordTooLarge {
                size: self.stub_data.len() + stub.len(),
                max: self.max_size,
            });
        }
        self.stub_data.extend_from_slice(stub);

        if header.packet_flags.is_last_frag() {
            self.received_last = true;
            return Ok(Some(self.stub_data.split().freeze()));
        }
        Ok(None)
    }

    /// Start over for another call on the same connection.
    pub fn reset(&mut self, call_id: u32) {
        self.call_id = call_id;
        self.stub_data.clear();
        self.context_id = 0;
        self.opnum = None;
        self.received_first = false;
        self.received_last = false;
    }
}
