//! Where cache bytes come from.
//!
//! Everything above this module talks to a [`CacheFileSource`]: a sparse
//! index per major plus the subfiles of one archive at a time. The source is
//! always passed in by the caller and never owned by a lookup or codec.

use crate::{
    group::GroupError,
    index::{CacheIndexFile, FileId, IndexEntry, SubFile},
    js5_compression::Js5CompressionError,
    js5_index::Js5IndexError,
    js5_masterindex::Js5MasterIndexError,
    packing::{ArchiveSizes, PackingScheme},
    store::StoreError,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use self::{caching::CachingSource, js5_source::Js5Source, memory::MemorySource};

pub mod caching;
pub mod js5_source;
pub mod memory;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("archive {major}.{minor} does not exist")]
    NotFound { major: u32, minor: u32 },
    #[error("subfile {0} does not exist")]
    MissingSubfile(FileId),
    #[error("major {0} is not a valid archive id")]
    InvalidMajor(u32),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("compression error: {0}")]
    Compression(#[from] Js5CompressionError),
    #[error("reference table error: {0}")]
    Index(#[from] Js5IndexError),
    #[error("master index error: {0}")]
    MasterIndex(#[from] Js5MasterIndexError),
    #[error("group error: {0}")]
    Group(#[from] GroupError),
    #[error("read cancelled")]
    Cancelled,
    #[error("read deadline exceeded")]
    DeadlineExceeded,
}

#[async_trait]
pub trait CacheFileSource: Send + Sync {
    /// The sparse index of `major`.
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError>;

    /// Every subfile of the archive described by `index`, in the order of
    /// `index.subindices`.
    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError>;

    async fn get_archive_by_id(&self, major: u32, minor: u32) -> Result<Vec<SubFile>, SourceError> {
        let index = self.get_cache_index(major).await?;
        let entry = index
            .get(minor)
            .cloned()
            .ok_or(SourceError::NotFound { major, minor })?;
        self.get_file_archive(&entry).await
    }

    async fn get_file(&self, major: u32, minor: u32, subfile: u32) -> Result<Vec<u8>, SourceError> {
        self.get_archive_by_id(major, minor)
            .await?
            .into_iter()
            .find(|file| file.fileid == subfile)
            .map(|file| file.buffer)
            .ok_or(SourceError::MissingSubfile(FileId::new(major, minor, subfile)))
    }

    /// Fetches a record by its linear id in a chunked major.
    async fn get_file_by_id(&self, major: u32, file_id: u32) -> Result<Vec<u8>, SourceError> {
        let id = ArchiveSizes.unpack(major, file_id);
        self.get_file(id.major, id.minor, id.subid).await
    }
}

#[async_trait]
impl<S: CacheFileSource + ?Sized> CacheFileSource for Arc<S> {
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
        (**self).get_cache_index(major).await
    }

    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
        (**self).get_file_archive(index).await
    }
}

#[async_trait]
impl<S: CacheFileSource + ?Sized> CacheFileSource for Box<S> {
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
        (**self).get_cache_index(major).await
    }

    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
        (**self).get_file_archive(index).await
    }
}
