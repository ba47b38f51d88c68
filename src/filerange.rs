use crate::{
    index::{CacheFileRef, FileId},
    lookup::{AddressError, LookupError},
    source::CacheFileSource,
};
use std::sync::Arc;
use tracing::trace;

/// Every stored subfile between `start` and `end` inclusive, within one major.
///
/// Minors strictly between the bounds contribute all their subfiles, the
/// boundary minors only those on the inner side of the bound's subfile id.
/// Results follow storage order: ascending minor, then position within the
/// entry. Absent minors are skipped.
pub async fn filerange(
    source: &dyn CacheFileSource,
    start: FileId,
    end: FileId,
) -> Result<Vec<CacheFileRef>, LookupError> {
    if start.major != end.major {
        return Err(AddressError::MultipleMajors {
            start: start.major,
            end: end.major,
        }
        .into());
    }

    let index = source.get_cache_index(start.major).await?;
    let mut files = Vec::new();
    for entry in index.range(start.minor, end.minor) {
        for (subindex, subid) in entry.subindices.iter().enumerate() {
            if entry.minor == start.minor && *subid < start.subid {
                continue;
            }
            if entry.minor == end.minor && *subid > end.subid {
                continue;
            }
            files.push(CacheFileRef::new(Arc::clone(entry), subindex));
        }
    }

    trace!(%start, %end, files = files.len(), "resolved file range");
    Ok(files)
}
