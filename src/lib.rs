//! colpack stores sequences of tree-shaped documents in a compact columnar
//! form. Rows sharing a shape are broken into one value stream per field,
//! each stream delta-coded into bit-packed blocks, and the streams are
//! interleaved back into a single byte sequence that can be decompressed one
//! field at a time without touching the rest.
//!
//! The pieces:
//!
//! - A msgpack-flavored element encoding with a canonical form: maps keep
//!   sorted keys and every number takes its shortest encoding, so equal
//!   documents produce equal bytes
//! - [`Value`] and [`ValueRef`] document trees over that encoding
//! - [`ColumnBuilder`], which takes rows, uses the first as the reference
//!   object describing the shared shape, and delta-codes every field against
//!   its previous value, with fields free to go missing per row
//! - [`decompress`], which pulls requested paths back out. A request for a
//!   single scalar field is served straight off its value stream; requests
//!   for whole subtrees replay the reference shape row by row and reassemble
//!   the requested part into an arena
//!
//! ```
//! # use colpack::{decompress, ColumnBuilder, Request, Value};
//! # use std::collections::BTreeMap;
//! # fn row(a: u64, b: bool) -> Value {
//! #     let mut map = BTreeMap::new();
//! #     map.insert("a".to_string(), Value::from(a));
//! #     map.insert("b".to_string(), Value::from(b));
//! #     Value::Map(map)
//! # }
//! let mut builder = ColumnBuilder::new();
//! builder.append(&row(1, true)).unwrap();
//! builder.append(&row(2, true)).unwrap();
//! builder.append(&row(2, false)).unwrap();
//! let bytes = builder.finish().unwrap();
//!
//! let arena = bumpalo::Bump::new();
//! let mut requests = [Request::new("a"), Request::new("b")];
//! let used = decompress(&arena, &bytes, &mut requests).unwrap();
//! assert_eq!(used, bytes.len());
//! let a: Vec<u64> = requests[0].buffer().iter().map(|v| v.as_u64().unwrap()).collect();
//! assert_eq!(a, [1, 2, 2]);
//! ```

mod buffer;
mod builder;
mod element;
mod error;
mod integer;
mod interleaved;
mod marker;
mod path;
mod reference;
mod simple8b;
mod stream;
mod subobj;
mod value;
mod value_ref;

pub use self::buffer::{ColumnBuffer, ColumnValue, Request};
pub use self::builder::ColumnBuilder;
pub use self::error::{Error, Result};
pub use self::integer::Integer;
pub use self::interleaved::decompress;
pub use self::path::Path;
pub use self::value::Value;
pub use self::value_ref::ValueRef;

/// The maximum allowed size of an encoded row document is 1 MiB.
pub const MAX_DOC_SIZE: usize = 1usize << 20; // 1 MiB

/// The maximum nesting depth of a document. Parsing stops rather than track
/// structure deeper than this.
pub const MAX_DEPTH: usize = 100;
