//! DISPPARAMS and EXCEPINFO (MS-OAUT 2.2.33, 2.2.36)

use super::{Bstr, Variant};
use dcom::types::HResult;
use midl_ndr::{read_sized, write_sized, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, UniquePtr};

/// DISPID of the value a property put assigns (`DISPID_PROPERTYPUT`).
pub const DISPID_PROPERTYPUT: i32 = -3;

/// Arguments of an `IDispatch::Invoke` call.
///
/// ```text
/// [size_is(cArgs)] VARIANT* rgvarg;
/// [size_is(cNamedArgs)] DISPID* rgdispidNamedArgs;
/// UINT cArgs;
/// UINT cNamedArgs;
/// ```
///
/// Arguments are stored in wire order, which is the reverse of the call
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispParams {
    pub args: Vec<UniquePtr<Variant>>,
    pub named_args: Vec<i32>,
    /// Which array pointers were non-null while decoding
    present: Present,
}

#[derive(Clone, Copy, Debug, Default)]
struct Present {
    args: bool,
    named_args: bool,
}

/// Decoding state only; never part of the value.
impl PartialEq for Present {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl DispParams {
    pub fn new(args: Vec<UniquePtr<Variant>>, named_args: Vec<i32>) -> Self {
        Self {
            args,
            named_args,
            present: Present::default(),
        }
    }

    /// Positional arguments given in call order.
    pub fn positional(args: impl IntoIterator<Item = Variant>) -> Self {
        let mut args: Vec<_> = args.into_iter().map(UniquePtr::new).collect();
        args.reverse();
        Self::new(args, Vec::new())
    }

    /// The single named argument of a property put.
    pub fn property_put(value: Variant) -> Self {
        Self::new(vec![UniquePtr::new(value)], vec![DISPID_PROPERTYPUT])
    }
}

fn count_u32(len: usize) -> midl_ndr::Result<u32> {
    u32::try_from(len).map_err(|_| NdrError::CountOverflow(len))
}

fn check_pointer(r: &NdrReader, present: bool, count: usize) -> midl_ndr::Result<()> {
    if !present && count != 0 {
        return Err(NdrError::ArraySizeMismatch { expected: count, got: 0 });
    }
    // every element takes at least four bytes
    r.check_count(count, 4)
}

impl NdrEncode for DispParams {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_referent(!self.args.is_empty());
        w.write_referent(!self.named_args.is_empty());
        w.write_u32(count_u32(self.args.len())?);
        w.write_u32(count_u32(self.named_args.len())?);
        Ok(())
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        if !self.args.is_empty() {
            write_sized(w, &self.args)?;
        }
        if !self.named_args.is_empty() {
            write_sized(w, &self.named_args)?;
        }
        Ok(())
    }
}

impl NdrDecode for DispParams {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        let present = Present {
            args: r.read_referent()? != 0,
            named_args: r.read_referent()? != 0,
        };
        let args_count = r.read_u32()? as usize;
        let named_count = r.read_u32()? as usize;
        check_pointer(r, present.args, args_count)?;
        check_pointer(r, present.named_args, named_count)?;
        // sized now, filled in once the pointees arrive
        Ok(Self {
            args: vec![UniquePtr::null(); args_count],
            named_args: vec![0; named_count],
            present,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        if self.present.args {
            self.args = read_sized(r, self.args.len())?;
        }
        if self.present.named_args {
            self.named_args = read_sized(r, self.named_args.len())?;
        }
        Ok(())
    }
}

/// Exception raised by `IDispatch::Invoke` (`DISP_E_EXCEPTION`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExcepInfo {
    pub code: u16,
    pub reserved: u16,
    pub source: Bstr,
    pub description: Bstr,
    pub help_file: Bstr,
    pub help_context: u32,
    pub reserved_ptr: u32,
    pub deferred_fill_in: u32,
    pub scode: HResult,
}

impl ExcepInfo {
    pub fn new(scode: HResult, source: &str, description: &str) -> Self {
        Self {
            source: Bstr::new(source),
            description: Bstr::new(description),
            scode,
            ..Default::default()
        }
    }
}

impl NdrEncode for ExcepInfo {
    fn ndr_encode(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        w.write_u16(self.code);
        w.write_u16(self.reserved);
        self.source.ndr_encode(w)?;
        self.description.ndr_encode(w)?;
        self.help_file.ndr_encode(w)?;
        w.write_u32(self.help_context);
        w.write_u32(self.reserved_ptr);
        w.write_u32(self.deferred_fill_in);
        self.scode.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> midl_ndr::Result<()> {
        self.source.ndr_encode_deferred(w)?;
        self.description.ndr_encode_deferred(w)?;
        self.help_file.ndr_encode_deferred(w)
    }
}

impl NdrDecode for ExcepInfo {
    fn ndr_decode(r: &mut NdrReader) -> midl_ndr::Result<Self> {
        Ok(Self {
            code: r.read_u16()?,
            reserved: r.read_u16()?,
            source: Bstr::ndr_decode(r)?,
            description: Bstr::ndr_decode(r)?,
            help_file: Bstr::ndr_decode(r)?,
            help_context: r.read_u32()?,
            reserved_ptr: r.read_u32()?,
            deferred_fill_in: r.read_u32()?,
            scode: HResult::ndr_decode(r)?,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> midl_ndr::Result<()> {
        self.source.ndr_decode_deferred(r)?;
        self.description.ndr_decode_deferred(r)?;
        self.help_file.ndr_decode_deferred(r)
    }
}
