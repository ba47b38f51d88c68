use super::{CacheFileSource, SourceError};
use crate::{
    group::Group,
    index::{CacheIndexFile, IndexEntry, SubFile},
    js5_compression::Js5Compression,
    js5_index::Js5Index,
    js5_masterindex::{Js5MasterIndex, MasterIndexFormat},
    store::{store_open, Store, StoreError, ARCHIVESET},
};
use async_trait::async_trait;
use crc32fast::hash;
use std::{path::Path, sync::Arc};
use tracing::{debug, trace};

/// A JS5 cache read through a [`Store`].
///
/// The index of a major is its reference table in archive 255. The index of
/// 255 itself lists the reference tables, and (255, 255) is the master index.
pub struct Js5Source<S> {
    store: S,
}

impl Js5Source<Box<dyn Store>> {
    /// Opens the cache directory at `path` with whichever store layout it holds.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        Ok(Self::new(store_open(path)?))
    }
}

impl<S: Store> Js5Source<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn archive_id(major: u32) -> Result<u8, SourceError> {
        u8::try_from(major).map_err(|_| SourceError::InvalidMajor(major))
    }

    fn reference_tables(&self) -> Result<CacheIndexFile, SourceError> {
        let mut index = CacheIndexFile::new(ARCHIVESET as u32);
        for minor in self.store.list(ARCHIVESET)? {
            if minor == ARCHIVESET as u32 {
                continue;
            }
            let raw = self.store.read(ARCHIVESET, minor)?;
            let table = Js5Index::read(Js5Compression::uncompress(&raw)?)?;
            index.insert(IndexEntry {
                major: ARCHIVESET as u32,
                minor,
                crc: hash(&raw),
                version: table.version as u32,
                size: raw.len() as u32,
                name: None,
                subindices: vec![0],
            });
        }
        Ok(index)
    }

    fn master_index(&self) -> Result<Vec<u8>, SourceError> {
        match self.store.read(ARCHIVESET, ARCHIVESET as u32) {
            Ok(raw) => Ok(Js5Compression::uncompress(raw)?),
            Err(StoreError::GroupNotFound(..)) => {
                trace!("no stored master index, creating one");
                let mut master = Js5MasterIndex::create(&self.store, MasterIndexFormat::Versioned)?;
                // the root index parser reads the versioned layout
                master.format = MasterIndexFormat::Versioned;
                Ok(master.write()?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<S: Store> CacheFileSource for Js5Source<S> {
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
        let archive = Self::archive_id(major)?;
        let index = if archive == ARCHIVESET {
            self.reference_tables()?
        } else {
            let raw = self.store.read(ARCHIVESET, archive as u32)?;
            Js5Index::read(Js5Compression::uncompress(raw)?)?.to_cache_index(major)
        };

        debug!(major, entries = index.len(), "read index");
        Ok(Arc::new(index))
    }

    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
        let archive = Self::archive_id(index.major)?;
        if archive == ARCHIVESET && index.minor == ARCHIVESET as u32 {
            return Ok(vec![SubFile {
                fileid: 0,
                buffer: self.master_index()?,
            }]);
        }

        let raw = self.store.read(archive, index.minor)?;
        let data = Js5Compression::uncompress(raw)?;
        trace!(major = index.major, minor = index.minor, len = data.len(), "read archive");

        Ok(Group::unpack(data, &index.subindices)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::flat_file_store::FlatFileStore;
    use std::fs;

    #[tokio::test]
    async fn test_invalid_major() {
        let dir = tempfile::tempdir().unwrap();
        let source = Js5Source::new(FlatFileStore::open(dir.path()).unwrap());

        assert!(matches!(
            source.get_cache_index(300).await,
            Err(SourceError::InvalidMajor(300))
        ));
    }

    #[tokio::test]
    async fn test_missing_reference_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("255")).unwrap();
        let source = Js5Source::new(FlatFileStore::open(dir.path()).unwrap());

        assert!(matches!(
            source.get_cache_index(2).await,
            Err(SourceError::Store(StoreError::GroupNotFound(255, 2)))
        ));
    }
}
