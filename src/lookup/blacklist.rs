use super::{AddressError, AddressStrategy, LogicalIndex, LookupError, Reversible, Sealed};
use crate::{
    index::{CacheFileRef, FileId},
    source::CacheFileSource,
};
use async_trait::async_trait;
use std::collections::HashSet;

/// Drops the archives listed by (major, minor) from whatever `parent`
/// resolves. Coordinate mapping is the parent's.
pub struct BlacklistIndex<P = Box<dyn AddressStrategy>> {
    parent: P,
    excluded: HashSet<(u32, u32)>,
}

impl<P: AddressStrategy> BlacklistIndex<P> {
    pub fn new<I: IntoIterator<Item = (u32, u32)>>(parent: P, excluded: I) -> Self {
        Self {
            parent,
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }
}

impl<P: AddressStrategy> Sealed for BlacklistIndex<P> {}
impl<P: Reversible> Reversible for BlacklistIndex<P> {}

#[async_trait]
impl<P: AddressStrategy> AddressStrategy for BlacklistIndex<P> {
    fn major(&self) -> Option<u32> {
        self.parent.major()
    }

    fn logical_dimensions(&self) -> usize {
        self.parent.logical_dimensions()
    }

    fn multi_index_archives(&self) -> bool {
        self.parent.multi_index_archives()
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        self.parent.file_to_logical(file)
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        self.parent.logical_to_file(id)
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        let mut files = self
            .parent
            .logical_range_to_files(source, start, end)
            .await?;
        files.retain(|file| !self.excluded.contains(&(file.index.major, file.index.minor)));
        Ok(files)
    }
}
