use crate::{constants::archive_size, index::FileId, lookup::AddressError};

/// Bijection between a linear record id and a (minor, subfile) pair of a
/// chunked major.
///
/// `unpack(major, pack(major, minor, subfile)?)` must return the input for
/// every pair in the major's valid domain, and `pack` must reject pairs
/// outside it.
pub trait PackingScheme: Send + Sync {
    fn pack(&self, major: u32, minor: u32, subfile: u32) -> Result<u32, AddressError>;
    fn unpack(&self, major: u32, file_id: u32) -> FileId;
}

/// Fixed number of records per archive, looked up per major.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveSizes;

impl PackingScheme for ArchiveSizes {
    fn pack(&self, major: u32, minor: u32, subfile: u32) -> Result<u32, AddressError> {
        let size = archive_size(major);
        if subfile >= size {
            return Err(AddressError::OutsidePacking {
                major,
                minor,
                subfile,
            });
        }

        minor
            .checked_mul(size)
            .and_then(|base| base.checked_add(subfile))
            .ok_or(AddressError::OutsidePacking {
                major,
                minor,
                subfile,
            })
    }

    fn unpack(&self, major: u32, file_id: u32) -> FileId {
        let size = archive_size(major);
        FileId::new(major, file_id / size, file_id % size)
    }
}
