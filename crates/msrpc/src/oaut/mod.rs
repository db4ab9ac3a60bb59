//! OLE Automation (MS-OAUT): wire types and IDispatch

mod bstr;
mod dispparams;
pub mod idispatch;
mod variant;

pub use bstr::{Bstr, FlaggedWordBlob};
pub use dispparams::{DispParams, ExcepInfo, DISPID_PROPERTYPUT};
pub use variant::{VarType, Variant, VARIANT_TRUE};

/// `LCID` for locale-neutral calls
pub const LOCALE_NEUTRAL: u32 = 0;

/// `IDispatch::Invoke` flags
pub mod dispatch_flags {
    pub const METHOD: u32 = 0x1;
    pub const PROPERTYGET: u32 = 0x2;
    pub const PROPERTYPUT: u32 = 0x4;
    pub const PROPERTYPUTREF: u32 = 0x8;
}
