use crate::{
    js5_compression::{Js5Compression, Js5CompressionError},
    js5_index::{Js5Index, Js5IndexError, Js5Protocol},
    store::{Store, StoreError, ARCHIVESET},
};
use crc32fast::hash;
use osrs_bytes::{ReadExt, WriteExt};
use serde::{Deserialize, Serialize};
use std::{
    cmp,
    io::{Read, Write},
};
use thiserror::Error;
use tracing::debug;

const DIGEST_BYTES: usize = 64;

#[derive(Error, Debug)]
pub enum Js5MasterIndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("compression error: {0}")]
    Compression(#[from] Js5CompressionError),
    #[error("reference table error: {0}")]
    Index(#[from] Js5IndexError),
    #[error("{0} entries do not fit a master index")]
    TooManyEntries(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasterIndexFormat {
    Original = 0,
    Versioned = 1,
    Digests = 2,
    Lengths = 3,
}

impl MasterIndexFormat {
    fn entry_size(self) -> usize {
        match self {
            MasterIndexFormat::Original => 4,
            MasterIndexFormat::Versioned => 8,
            MasterIndexFormat::Digests => 8 + DIGEST_BYTES,
            MasterIndexFormat::Lengths => 16 + DIGEST_BYTES,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Js5MasterIndexEntry {
    pub version: i32,
    pub checksum: u32,
    pub groups: u32,
    pub total_uncompressed_length: u32,
    #[serde(default)]
    pub digest: Option<Vec<u8>>,
}

/// The root table at (255, 255): one entry per reference table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Js5MasterIndex {
    pub format: MasterIndexFormat,
    pub entries: Vec<Js5MasterIndexEntry>,
}

impl Js5MasterIndex {
    pub fn read<T: AsRef<[u8]>>(
        buf: T,
        format: MasterIndexFormat,
    ) -> Result<Js5MasterIndex, Js5MasterIndexError> {
        let mut buf = buf.as_ref();

        let len = if format >= MasterIndexFormat::Digests {
            buf.read_u8()? as usize
        } else {
            buf.len() / format.entry_size()
        };

        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let checksum = buf.read_u32()?;
            let version = if format >= MasterIndexFormat::Versioned {
                buf.read_i32()?
            } else {
                0
            };
            let (groups, total_uncompressed_length) = if format >= MasterIndexFormat::Lengths {
                (buf.read_u32()?, buf.read_u32()?)
            } else {
                (0, 0)
            };
            let digest = if format >= MasterIndexFormat::Digests {
                let mut digest = vec![0; DIGEST_BYTES];
                buf.read_exact(&mut digest)?;
                Some(digest)
            } else {
                None
            };

            entries.push(Js5MasterIndexEntry {
                version,
                checksum,
                groups,
                total_uncompressed_length,
                digest,
            });
        }

        // signed formats carry a trailing signature, which is not verified
        Ok(Js5MasterIndex { format, entries })
    }

    pub fn write(&self) -> Result<Vec<u8>, Js5MasterIndexError> {
        let mut buf = Vec::with_capacity(1 + self.entries.len() * self.format.entry_size());

        if self.format >= MasterIndexFormat::Digests {
            let len = u8::try_from(self.entries.len())
                .map_err(|_| Js5MasterIndexError::TooManyEntries(self.entries.len()))?;
            buf.write_u8(len)?;
        }

        for entry in &self.entries {
            buf.write_u32(entry.checksum)?;

            if self.format >= MasterIndexFormat::Versioned {
                buf.write_i32(entry.version)?;
            }

            if self.format >= MasterIndexFormat::Lengths {
                buf.write_u32(entry.groups)?;
                buf.write_u32(entry.total_uncompressed_length)?;
            }

            if self.format >= MasterIndexFormat::Digests {
                let mut digest = [0u8; DIGEST_BYTES];
                if let Some(stored) = &entry.digest {
                    let len = cmp::min(stored.len(), DIGEST_BYTES);
                    digest[..len].copy_from_slice(&stored[..len]);
                }
                buf.write_all(&digest)?;
            }
        }

        Ok(buf)
    }

    /// Builds the master index describing every reference table in `store`,
    /// at the lowest format able to hold what those tables carry.
    pub fn create<S: Store + ?Sized>(
        store: &S,
        format: MasterIndexFormat,
    ) -> Result<Js5MasterIndex, Js5MasterIndexError> {
        let mut master_index = Js5MasterIndex {
            format,
            entries: Vec::new(),
        };

        let mut next_archive = 0;
        for archive in store.list(ARCHIVESET)? {
            // the master index itself
            if archive == ARCHIVESET as u32 {
                continue;
            }
            let read = store.read(ARCHIVESET, archive)?;
            let checksum = hash(&read);
            let index = Js5Index::read(Js5Compression::uncompress(&read)?)?;

            if index.has_lengths {
                master_index.format = cmp::max(master_index.format, MasterIndexFormat::Lengths);
            } else if index.has_digests {
                master_index.format = cmp::max(master_index.format, MasterIndexFormat::Digests);
            } else if index.protocol >= Js5Protocol::Versioned as u8 {
                master_index.format = cmp::max(master_index.format, MasterIndexFormat::Versioned);
            }

            // missing reference tables leave zeroed entries
            for _ in next_archive..archive {
                master_index.entries.push(Js5MasterIndexEntry::default());
            }

            master_index.entries.push(Js5MasterIndexEntry {
                version: index.version,
                checksum,
                groups: index.groups.len() as u32,
                total_uncompressed_length: index
                    .groups
                    .values()
                    .map(|group| group.uncompressed_length)
                    .fold(0u32, u32::wrapping_add),
                digest: None,
            });

            next_archive = archive + 1;
        }

        debug!(
            entries = master_index.entries.len(),
            format = ?master_index.format,
            "created master index"
        );

        Ok(master_index)
    }
}
