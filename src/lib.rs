//! Logical addressing and decoding of RS2 cache files.
//!
//! Content is addressed by logical ids (an item id, a map square) that an
//! [`AddressStrategy`](lookup::AddressStrategy) translates to physical
//! `(major, minor, subfile)` coordinates. A [`ContentCodec`](codec::ContentCodec)
//! pairs such a strategy with the decoding of one kind of content, and the
//! [`registry`] names every codec. Files are read through a
//! [`CacheFileSource`](source::CacheFileSource), usually a
//! [`Js5Source`](source::Js5Source) over an on-disk JS5 store.

pub mod codec;
pub mod constants;
pub mod djb2;
pub mod extract;
pub mod filerange;
pub mod group;
pub mod imgutils;
pub mod index;
pub mod js5_compression;
pub mod js5_index;
pub mod js5_masterindex;
pub mod lookup;
pub mod packing;
pub mod parser;
pub mod registry;
pub mod source;
pub mod sprite;
pub mod store;

pub use codec::{Artifact, CodecError, ContentCodec, DecodeFlags, DumpOutput, ReadContext};
pub use extract::{extract_files, DirectoryOutput, ExtractError, ExtractOptions, LogicalRange};
pub use index::{CacheFileRef, CacheIndexFile, FileId, IndexEntry, SubFile};
pub use lookup::{AddressError, AddressStrategy, LogicalIndex, LookupError, Reversible};
pub use parser::{FileParser, ParseError, ParserKind, ParserSet};
pub use registry::{CodecMode, JsonMode, TextureFormat};
pub use source::{CacheFileSource, CachingSource, Js5Source, MemorySource, SourceError};
