use self::{disk_store::DiskStore, flat_file_store::FlatFileStore};
use std::path::Path;
use thiserror::Error;

pub mod disk_store;
pub mod flat_file_store;

const DATA_PATH: &str = "main_file_cache.dat2";
const LEGACY_DATA_PATH: &str = "main_file_cache.dat";

/// The archive whose groups are the reference tables of every other archive.
pub const ARCHIVESET: u8 = 255;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive {0} does not exist")]
    ArchiveNotFound(u8),
    #[error("group {1} of archive {0} does not exist")]
    GroupNotFound(u8, u32),
    #[error("group shorter than expected")]
    GroupTooShort,
    #[error("next block is outside the data file")]
    NextBlockOutsideDataFile,
    #[error("expected group {0}, found {1}")]
    GroupMismatch(u32, u32),
    #[error("expected block number {0}, found {1}")]
    BlockMismatch(u16, u16),
    #[error("expected archive {0}, found {1}")]
    ArchiveMismatch(u8, u8),
    #[error("cache path is not valid unicode")]
    RootToString,
}

/// Raw, still compressed, group storage of the RS2 formats.
pub trait Store: Send + Sync {
    /// Group ids present in `archive`, ascending.
    fn list(&self, archive: u8) -> Result<Vec<u32>, StoreError>;
    fn read(&self, archive: u8, group: u32) -> Result<Vec<u8>, StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn list(&self, archive: u8) -> Result<Vec<u32>, StoreError> {
        (**self).list(archive)
    }

    fn read(&self, archive: u8, group: u32) -> Result<Vec<u8>, StoreError> {
        (**self).read(archive, group)
    }
}

/// Opens a `DiskStore` when the directory holds a data file, a `FlatFileStore` otherwise.
pub fn store_open<P: AsRef<Path>>(path: P) -> Result<Box<dyn Store>, StoreError> {
    let path = path.as_ref();
    let has_data_file = path.join(DATA_PATH).exists();
    let has_legacy_data_file = path.join(LEGACY_DATA_PATH).exists();

    if has_data_file || has_legacy_data_file {
        Ok(Box::new(DiskStore::open(path)?))
    } else {
        Ok(Box::new(FlatFileStore::open(path)?))
    }
}
