//! Read typed fields out of binary blobs using a small descriptor language.
//!
//! Blobscope decodes integers, floats, narrow and wide strings, nested
//! structs and host-computed values from a byte region: an in-process
//! buffer, a memory-mapped file, or a POSIX or SysV shared-memory segment.
//! What to read is described by a descriptor string such as
//! `u32 str#16 header*4`, where `header` is a struct declared earlier.
//!
//! Most users should begin with [`Session`], which holds the active
//! [`Source`], the struct [`Registry`] and a cache of parsed descriptors:
//!
//! ```
//! let mut session = Session::new();
//! session.install(Source::from_vec("blob", bytes));
//! session.declare("header", "u16:magic u16:version void#4 u32:length")?;
//!
//! let values = session.read("header str")?;
//! ```
//!
//! The layers underneath are public for applications needing finer control:
//! the [`descriptor`] parsers, the [`Registry`], the bounds-checked reads of
//! [`Source`], and the [`Decoder`].
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable the [`FromRecord`](macro@FromRecord) derive macro
//!   (default).

pub mod decode;
pub mod descriptor;
mod error;
pub mod registry;
pub mod session;
pub mod source;
pub mod value;

pub use decode::{CallbackTable, Callbacks, Decoder, MAX_EMPTY_REPEAT, NoCallbacks};
pub use error::Error;
pub use registry::Registry;
pub use session::Session;
pub use source::{Source, SourceConfig};
pub use value::{FromRecord, FromValue, Record, Value};

/// Derive [`FromRecord`] for a struct with named fields.
///
/// _Requires Cargo feature `derive`._
///
/// Each struct field is extracted from the record field of the same name
/// with [`FromValue`]. A missing record field is an error unless the struct
/// field is an `Option<T>`. The derive also implements [`FromValue`], so
/// derived structs nest.
///
/// ```
/// #[derive(Debug, FromRecord)]
/// struct Header {
///     magic: u16,
///     #[field("version")]
///     revision: u16,
///     label: Option<String>,
///     #[field(skip)]
///     cached: Vec<u8>,
/// }
/// ```
///
/// `#[field("name")]` reads a differently named record field, and
/// `#[field(skip)]` fills the struct field with [`Default`] instead.
#[cfg(feature = "derive")]
pub use blobscope_derive::FromRecord;
