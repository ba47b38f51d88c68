use crate::index::{CacheIndexFile, IndexEntry};
use osrs_bytes::{ReadExt, WriteExt};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
};
use thiserror::Error;

const DIGEST_BYTES: usize = 64;

#[derive(Error, Debug)]
pub enum Js5IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported protocol {0}")]
    UnsupportedProtocol(u8),
    #[error("id {0} does not fit protocol {1}")]
    IdTooLarge(u32, u8),
    #[error("digest of group {0} is not {DIGEST_BYTES} bytes")]
    DigestLength(u32),
}

pub enum Js5Protocol {
    Original = 5,
    Versioned = 6,
    Smart = 7,
}

enum Js5IndexFlags {
    Names = 0x1,
    Digests = 0x2,
    Lengths = 0x4,
    UncompressedChecksums = 0x8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Js5IndexFile {
    pub name_hash: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Js5IndexEntry {
    pub name_hash: i32,
    pub version: u32,
    pub checksum: u32,
    pub uncompressed_checksum: u32,
    pub length: u32,
    pub uncompressed_length: u32,
    #[serde(default)]
    pub digest: Vec<u8>,
    pub files: BTreeMap<u32, Js5IndexFile>,
}

impl Js5IndexEntry {
    fn empty() -> Self {
        Self {
            name_hash: -1,
            version: 0,
            checksum: 0,
            uncompressed_checksum: 0,
            length: 0,
            uncompressed_length: 0,
            digest: Vec::new(),
            files: BTreeMap::new(),
        }
    }
}

/// A JS5 reference table: the group and file listing of one archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Js5Index {
    pub protocol: u8,
    pub version: i32,
    pub has_names: bool,
    pub has_digests: bool,
    pub has_lengths: bool,
    pub has_uncompressed_checksums: bool,
    pub groups: BTreeMap<u32, Js5IndexEntry>,
}

fn read_id(buf: &mut &[u8], smart: bool) -> Result<u32, Js5IndexError> {
    Ok(if smart {
        buf.read_u32_smart()?
    } else {
        buf.read_u16()? as u32
    })
}

fn write_id(buf: &mut Vec<u8>, id: u32, protocol: u8) -> Result<(), Js5IndexError> {
    if protocol >= Js5Protocol::Smart as u8 {
        if id < 0x8000 {
            buf.write_u16(id as u16)?;
        } else if id < 0x8000_0000 {
            buf.write_u32(id | 0x8000_0000)?;
        } else {
            return Err(Js5IndexError::IdTooLarge(id, protocol));
        }
    } else {
        let id = u16::try_from(id).map_err(|_| Js5IndexError::IdTooLarge(id, protocol))?;
        buf.write_u16(id)?;
    }
    Ok(())
}

impl Js5Index {
    pub fn read<T: AsRef<[u8]>>(buf: T) -> Result<Js5Index, Js5IndexError> {
        let mut buf = buf.as_ref();

        let protocol = buf.read_u8()?;
        if !(Js5Protocol::Original as u8..=Js5Protocol::Smart as u8).contains(&protocol) {
            return Err(Js5IndexError::UnsupportedProtocol(protocol));
        }
        let smart = protocol >= Js5Protocol::Smart as u8;

        let version = if protocol >= Js5Protocol::Versioned as u8 {
            buf.read_i32()?
        } else {
            0
        };
        let flags = buf.read_u8()?;
        let size = read_id(&mut buf, smart)?;

        let mut index = Js5Index {
            protocol,
            version,
            has_names: (flags & Js5IndexFlags::Names as u8) != 0,
            has_digests: (flags & Js5IndexFlags::Digests as u8) != 0,
            has_lengths: (flags & Js5IndexFlags::Lengths as u8) != 0,
            has_uncompressed_checksums: (flags & Js5IndexFlags::UncompressedChecksums as u8) != 0,
            groups: BTreeMap::new(),
        };

        let mut prev_group_id = 0u32;
        for _ in 0..size {
            prev_group_id = prev_group_id.wrapping_add(read_id(&mut buf, smart)?);
            index.groups.insert(prev_group_id, Js5IndexEntry::empty());
        }

        if index.has_names {
            for group in index.groups.values_mut() {
                group.name_hash = buf.read_i32()?;
            }
        }

        for group in index.groups.values_mut() {
            group.checksum = buf.read_u32()?;
        }

        if index.has_uncompressed_checksums {
            for group in index.groups.values_mut() {
                group.uncompressed_checksum = buf.read_u32()?;
            }
        }

        if index.has_digests {
            for group in index.groups.values_mut() {
                let mut digest = vec![0; DIGEST_BYTES];
                buf.read_exact(&mut digest)?;
                group.digest = digest;
            }
        }

        if index.has_lengths {
            for group in index.groups.values_mut() {
                group.length = buf.read_u32()?;
                group.uncompressed_length = buf.read_u32()?;
            }
        }

        for group in index.groups.values_mut() {
            group.version = buf.read_u32()?;
        }

        let mut group_sizes = Vec::with_capacity(index.groups.len());
        for _ in 0..index.groups.len() {
            group_sizes.push(read_id(&mut buf, smart)?);
        }

        for (group, group_size) in index.groups.values_mut().zip(group_sizes) {
            let mut prev_file_id = 0u32;
            for _ in 0..group_size {
                prev_file_id = prev_file_id.wrapping_add(read_id(&mut buf, smart)?);
                group
                    .files
                    .insert(prev_file_id, Js5IndexFile { name_hash: -1 });
            }
        }

        if index.has_names {
            for group in index.groups.values_mut() {
                for file in group.files.values_mut() {
                    file.name_hash = buf.read_i32()?;
                }
            }
        }

        Ok(index)
    }

    pub fn write(&self) -> Result<Vec<u8>, Js5IndexError> {
        let mut buf = Vec::new();
        let protocol = self.protocol;

        buf.write_u8(protocol)?;
        if protocol >= Js5Protocol::Versioned as u8 {
            buf.write_i32(self.version)?;
        }

        let mut flags = 0;
        if self.has_names {
            flags |= Js5IndexFlags::Names as u8;
        }
        if self.has_digests {
            flags |= Js5IndexFlags::Digests as u8;
        }
        if self.has_lengths {
            flags |= Js5IndexFlags::Lengths as u8;
        }
        if self.has_uncompressed_checksums {
            flags |= Js5IndexFlags::UncompressedChecksums as u8;
        }
        buf.write_u8(flags)?;

        write_id(&mut buf, self.groups.len() as u32, protocol)?;
        let mut prev_group_id = 0;
        for id in self.groups.keys() {
            write_id(&mut buf, id - prev_group_id, protocol)?;
            prev_group_id = *id;
        }

        if self.has_names {
            for group in self.groups.values() {
                buf.write_i32(group.name_hash)?;
            }
        }

        for group in self.groups.values() {
            buf.write_u32(group.checksum)?;
        }

        if self.has_uncompressed_checksums {
            for group in self.groups.values() {
                buf.write_u32(group.uncompressed_checksum)?;
            }
        }

        if self.has_digests {
            for (id, group) in &self.groups {
                if group.digest.len() != DIGEST_BYTES {
                    return Err(Js5IndexError::DigestLength(*id));
                }
                buf.write_all(&group.digest)?;
            }
        }

        if self.has_lengths {
            for group in self.groups.values() {
                buf.write_u32(group.length)?;
                buf.write_u32(group.uncompressed_length)?;
            }
        }

        for group in self.groups.values() {
            buf.write_u32(group.version)?;
        }

        for group in self.groups.values() {
            write_id(&mut buf, group.files.len() as u32, protocol)?;
        }

        for group in self.groups.values() {
            let mut prev_file_id = 0;
            for id in group.files.keys() {
                write_id(&mut buf, id - prev_file_id, protocol)?;
                prev_file_id = *id;
            }
        }

        if self.has_names {
            for group in self.groups.values() {
                for file in group.files.values() {
                    buf.write_i32(file.name_hash)?;
                }
            }
        }

        Ok(buf)
    }

    /// The addressing view of this table as the index of `major`.
    pub fn to_cache_index(&self, major: u32) -> CacheIndexFile {
        CacheIndexFile::from_entries(
            major,
            self.groups.iter().map(|(minor, group)| IndexEntry {
                major,
                minor: *minor,
                crc: group.checksum,
                version: group.version,
                size: group.length,
                name: self.has_names.then_some(group.name_hash as u32),
                subindices: group.files.keys().copied().collect(),
            }),
        )
    }
}
