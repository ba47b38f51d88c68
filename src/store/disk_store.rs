use super::{Store, StoreError, DATA_PATH, LEGACY_DATA_PATH};
use memmap2::Mmap;
use osrs_bytes::ReadExt;
use std::{cmp, collections::HashMap, fs::File, io::Cursor, path::Path};
use tracing::debug;

const EXTENDED_BLOCK_HEADER_SIZE: usize = 10;
const BLOCK_HEADER_SIZE: usize = 8;
const EXTENDED_BLOCK_DATA_SIZE: usize = 510;
const BLOCK_DATA_SIZE: usize = 512;
const MUSIC_ARCHIVE: u8 = 40;
const BLOCK_SIZE: usize = BLOCK_HEADER_SIZE + BLOCK_DATA_SIZE;
const INDEX_ENTRY_SIZE: usize = 6;

const INDEX_PATH: &str = "main_file_cache.idx";
const MUSIC_DATA_PATH: &str = "main_file_cache.dat2m";

const MAX_ARCHIVE: usize = 255;

struct IndexEntry {
    size: u32,
    block: u32,
}

/// The `main_file_cache.dat2` + `.idx*` sector store, memory mapped.
pub struct DiskStore {
    root: String,
    data: Mmap,
    music_data: Option<Mmap>,
    indexes: HashMap<u8, Mmap>,
    legacy: bool,
}

impl DiskStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DiskStore, StoreError> {
        let path = path.as_ref();
        let js5_data_path = path.join(DATA_PATH);

        // The JS5 data file takes precedence over the legacy one.
        let legacy = !js5_data_path.exists();
        let data_path = if legacy {
            path.join(LEGACY_DATA_PATH)
        } else {
            js5_data_path
        };

        // SAFETY: the cache files are only read; concurrent external writes are
        // outside what this store supports.
        let data = unsafe { Mmap::map(&File::open(data_path)?) }?;

        let music_data_path = path.join(MUSIC_DATA_PATH);
        let music_data = if music_data_path.exists() {
            Some(unsafe { Mmap::map(&File::open(music_data_path)?) }?)
        } else {
            None
        };

        let mut indexes = HashMap::new();
        for archive in 0..=MAX_ARCHIVE {
            let index_path = path.join(format!("{INDEX_PATH}{archive}"));
            if index_path.exists() {
                let index = unsafe { Mmap::map(&File::open(&index_path)?) }?;
                indexes.insert(archive as u8, index);
            }
        }

        let root = path.to_str().ok_or(StoreError::RootToString)?.to_owned();
        debug!(root = %root, archives = indexes.len(), legacy, "opened disk store");

        Ok(DiskStore {
            root,
            data,
            music_data,
            indexes,
            legacy,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn get_data(&self, archive: u8) -> &Mmap {
        match &self.music_data {
            Some(music_data) if archive == MUSIC_ARCHIVE => music_data,
            _ => &self.data,
        }
    }

    fn get_index(&self, archive: u8) -> Result<&Mmap, StoreError> {
        self.indexes
            .get(&archive)
            .ok_or(StoreError::ArchiveNotFound(archive))
    }

    fn read_index_entry(&self, archive: u8, group: u32) -> Result<IndexEntry, StoreError> {
        let index = self.get_index(archive)?;

        let pos = (group as usize) * INDEX_ENTRY_SIZE;
        if pos + INDEX_ENTRY_SIZE > index.len() {
            return Err(StoreError::GroupNotFound(archive, group));
        }

        let mut csr = Cursor::new(&index[pos..pos + INDEX_ENTRY_SIZE]);
        let size = csr.read_u24()?;
        let block = csr.read_u24()?;

        Ok(IndexEntry { size, block })
    }
}

impl Store for DiskStore {
    fn list(&self, archive: u8) -> Result<Vec<u32>, StoreError> {
        let index = self.get_index(archive)?;

        Ok(index
            .chunks_exact(INDEX_ENTRY_SIZE)
            .enumerate()
            .filter(|(_, entry)| entry[3..6] != [0, 0, 0])
            .map(|(group, _)| group as u32)
            .collect())
    }

    fn read(&self, archive: u8, group: u32) -> Result<Vec<u8>, StoreError> {
        let entry = self.read_index_entry(archive, group)?;
        if entry.block == 0 {
            return Err(StoreError::GroupNotFound(archive, group));
        }

        let mut buf = Vec::with_capacity(entry.size as usize);
        let data = self.get_data(archive);

        let extended = group >= 65536;
        let (header_size, data_size) = if extended {
            (EXTENDED_BLOCK_HEADER_SIZE, EXTENDED_BLOCK_DATA_SIZE)
        } else {
            (BLOCK_HEADER_SIZE, BLOCK_DATA_SIZE)
        };

        let mut block = entry.block;
        let mut num = 0;

        while buf.len() < entry.size as usize {
            if block == 0 {
                return Err(StoreError::GroupTooShort);
            }

            let pos = block as usize * BLOCK_SIZE;
            if pos + header_size > data.len() {
                return Err(StoreError::NextBlockOutsideDataFile);
            }

            let mut header = Cursor::new(&data[pos..pos + header_size]);
            let actual_group = if extended {
                header.read_u32()?
            } else {
                header.read_u16()? as u32
            };
            let actual_num = header.read_u16()?;
            let next_block = header.read_u24()?;
            let actual_archive = header.read_u8()?.wrapping_sub(u8::from(self.legacy));

            if actual_group != group {
                return Err(StoreError::GroupMismatch(group, actual_group));
            }
            if actual_num != num {
                return Err(StoreError::BlockMismatch(num, actual_num));
            }
            if actual_archive != archive {
                return Err(StoreError::ArchiveMismatch(archive, actual_archive));
            }

            let len = cmp::min(entry.size as usize - buf.len(), data_size);
            let start = pos + header_size;
            if start + len > data.len() {
                return Err(StoreError::NextBlockOutsideDataFile);
            }
            buf.extend_from_slice(&data[start..start + len]);

            block = next_block;
            num = num.wrapping_add(1);
        }

        Ok(buf)
    }
}
