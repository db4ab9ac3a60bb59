//! NDR (Network Data Representation) runtime library
//!
//! This crate is the marshaling engine behind the interface stubs: it
//! implements the NDR20 transfer syntax of DCE RPC and MS-RPCE.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2, 4 or 8 bytes), measured
//!   from the start of the stub data
//! - Embedded pointers are sent as 4-byte referent IDs; the data they point
//!   to is deferred until the enclosing top-level parameter is complete
//! - Conformant data carries its max count ahead of the elements, hoisted to
//!   the front of the enclosing structure
//! - Strings are conformant varying arrays that count the NUL terminator
//!
//! # Example
//!
//! ```
//! use midl_ndr::{NdrReader, NdrWString, NdrWriter, UniquePtr};
//!
//! let mut w = NdrWriter::new();
//! w.write_param(&42u32).unwrap();
//! w.write_param(&UniquePtr::new(NdrWString::from("cert"))).unwrap();
//!
//! let mut r = NdrReader::new(w.into_bytes());
//! assert_eq!(r.read_param::<u32>().unwrap(), 42);
//! let s: UniquePtr<NdrWString> = r.read_param().unwrap();
//! assert_eq!(s.as_ref().map(|s| s.as_str()), Some("cert"));
//! ```

mod arrays;
mod codec;
mod context;
mod error;
mod pointers;
mod reader;
mod strings;
mod unions;
mod writer;

pub use arrays::{read_sized, write_sized, ConformantArray, ConformantVaryingArray, VaryingArray};
pub use codec::{NdrDecode, NdrEncode};
pub use context::NdrContext;
pub use error::{NdrError, Result, MAX_NDR_ALLOCATION_SIZE};
pub use pointers::{FullPtr, RefPtr, UniquePtr};
pub use reader::NdrReader;
pub use strings::{NdrString, NdrWString};
pub use unions::{decode_union, encode_union, NdrUnion};
pub use writer::{NdrWriter, FIRST_REFERENT_ID};

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
