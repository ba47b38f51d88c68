use super::{
    check_dimensions, check_range, AddressError, AddressStrategy, LogicalIndex, LookupError,
    Reversible, Sealed,
};
use crate::{
    constants::major,
    djb2::djb2_hash,
    index::{CacheFileRef, FileId},
    source::CacheFileSource,
};
use async_trait::async_trait;
use std::{cmp, sync::Arc};
use tracing::trace;

const WORLD_STRIDE: u32 = 128;

// Extent of the legacy named map squares.
const OLD_MAX_X: u32 = 100;
const OLD_MAX_Z: u32 = 200;

/// Logical id `[x, z]` of a map square, where `minor = x + z * stride`.
/// Only the subfile of the chosen kind is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldmapIndex {
    subfile: u32,
    stride: u32,
}

impl WorldmapIndex {
    pub fn new(subfile: u32) -> Self {
        Self {
            subfile,
            stride: WORLD_STRIDE,
        }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }
}

impl Sealed for WorldmapIndex {}
impl Reversible for WorldmapIndex {}

#[async_trait]
impl AddressStrategy for WorldmapIndex {
    fn major(&self) -> Option<u32> {
        Some(major::MAPSQUARES)
    }

    fn logical_dimensions(&self) -> usize {
        2
    }

    fn multi_index_archives(&self) -> bool {
        true
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![file.minor % self.stride, file.minor / self.stride])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 2)?;
        let (x, z) = (id[0], id[1]);
        let outside = AddressError::OutsideGrid {
            x,
            z,
            stride: self.stride,
        };
        if x >= self.stride {
            return Err(outside);
        }

        let minor = z
            .checked_mul(self.stride)
            .and_then(|row| row.checked_add(x))
            .ok_or(outside)?;
        Ok(FileId::new(major::MAPSQUARES, minor, self.subfile))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 2)?;
        let index = source.get_cache_index(major::MAPSQUARES).await?;

        let mut files = Vec::new();
        for entry in index.iter() {
            let x = entry.minor % self.stride;
            let z = entry.minor / self.stride;
            if x < start[0] || x > end[0] || z < start[1] || z > end[1] {
                continue;
            }
            files.extend(
                entry
                    .subindices
                    .iter()
                    .enumerate()
                    .filter(|(_, subid)| **subid == self.subfile)
                    .map(|(subindex, _)| CacheFileRef::new(Arc::clone(entry), subindex)),
            );
        }

        Ok(files)
    }
}

/// The file kinds of the legacy named map squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OldMapFile {
    Locations,
    Tiles,
}

impl OldMapFile {
    fn key(self) -> char {
        match self {
            OldMapFile::Locations => 'l',
            OldMapFile::Tiles => 'm',
        }
    }
}

/// Legacy map squares, found by the name hash of `"{key}{x}_{z}"`.
///
/// The name hash cannot be turned back into coordinates, so this strategy
/// only resolves ranges. `file_to_logical` yields `[255, minor]` and
/// `logical_to_file` always fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OldWorldmapIndex {
    file: OldMapFile,
}

impl OldWorldmapIndex {
    pub fn new(file: OldMapFile) -> Self {
        Self { file }
    }

    fn name_hash(&self, x: u32, z: u32) -> u32 {
        djb2_hash(format!("{}{x}_{z}", self.file.key()))
    }
}

impl Sealed for OldWorldmapIndex {}

#[async_trait]
impl AddressStrategy for OldWorldmapIndex {
    fn major(&self) -> Option<u32> {
        Some(major::MAPSQUARES)
    }

    fn logical_dimensions(&self) -> usize {
        2
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![255, file.minor])
    }

    fn logical_to_file(&self, _id: &[u32]) -> Result<FileId, AddressError> {
        Err(AddressError::Irreversible("named map square lookup"))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 2)?;
        let index = source.get_cache_index(major::MAPSQUARES).await?;

        let mut files = Vec::new();
        for x in start[0]..=cmp::min(end[0], OLD_MAX_X) {
            for z in start[1]..=cmp::min(end[1], OLD_MAX_Z) {
                match index.get_named(self.name_hash(x, z)) {
                    Some(entry) => files.push(CacheFileRef::new(Arc::clone(entry), 0)),
                    None => trace!(x, z, "no named map square"),
                }
            }
        }

        Ok(files)
    }
}
