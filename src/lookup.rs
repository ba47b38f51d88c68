//! Address strategies: how a logical id of some content type maps onto the
//! physical (major, minor, subfile) coordinates of the cache.

use crate::{
    index::{CacheFileRef, FileId},
    parser::ParseError,
    source::{CacheFileSource, SourceError},
};
use async_trait::async_trait;
use thiserror::Error;

pub use self::{
    blacklist::BlacklistIndex,
    enum_lookup::EnumLookup,
    index_file::{IndexFileIndex, RootIndexFileIndex},
    standard::{ChunkedIndex, NoArchiveIndex, RawIndex, SingleMinorIndex, StandardIndex},
    worldmap::{OldMapFile, OldWorldmapIndex, WorldmapIndex},
};

pub mod blacklist;
pub mod enum_lookup;
pub mod index_file;
pub mod standard;
pub mod worldmap;

/// A logical coordinate. Its length is the strategy's `logical_dimensions`.
pub type LogicalIndex = Vec<u32>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("expected a {expected} dimensional id, found {found}")]
    Dimensions { expected: usize, found: usize },
    #[error("subfile of {0} is not 0")]
    NonZeroSubfile(FileId),
    #[error("range spans majors {start} to {end}")]
    MultipleMajors { start: u32, end: u32 },
    #[error("{0} has no reverse mapping")]
    Irreversible(&'static str),
    #[error("{major}.{minor}.{subfile} is outside the packing of its major")]
    OutsidePacking { major: u32, minor: u32, subfile: u32 },
    #[error("({x}, {z}) is outside a grid of stride {stride}")]
    OutsideGrid { x: u32, z: u32, stride: u32 },
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("address error: {0}")]
    Address(#[from] AddressError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

mod private {
    pub trait Sealed {}
}

pub(crate) use private::Sealed;

#[async_trait]
pub trait AddressStrategy: Sealed + Send + Sync {
    /// The major every resolved file belongs to, `None` when the caller picks it.
    fn major(&self) -> Option<u32>;

    fn logical_dimensions(&self) -> usize;

    /// Whether one archive holds several logically distinct subfiles.
    fn multi_index_archives(&self) -> bool;

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError>;

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError>;

    /// Every stored file whose logical id lies in the inclusive range
    /// `start..=end`.
    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError>;
}

/// Strategies whose `logical_to_file` inverts `file_to_logical` for every
/// file they resolve.
pub trait Reversible: AddressStrategy {}

impl<T: AddressStrategy + ?Sized> Sealed for Box<T> {}

#[async_trait]
impl<T: AddressStrategy + ?Sized> AddressStrategy for Box<T> {
    fn major(&self) -> Option<u32> {
        (**self).major()
    }

    fn logical_dimensions(&self) -> usize {
        (**self).logical_dimensions()
    }

    fn multi_index_archives(&self) -> bool {
        (**self).multi_index_archives()
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        (**self).file_to_logical(file)
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        (**self).logical_to_file(id)
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        (**self).logical_range_to_files(source, start, end).await
    }
}

impl<T: Reversible + ?Sized> Reversible for Box<T> {}

pub(crate) fn check_dimensions(id: &[u32], expected: usize) -> Result<(), AddressError> {
    if id.len() != expected {
        return Err(AddressError::Dimensions {
            expected,
            found: id.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_range(start: &[u32], end: &[u32], expected: usize) -> Result<(), AddressError> {
    check_dimensions(start, expected)?;
    check_dimensions(end, expected)
}
