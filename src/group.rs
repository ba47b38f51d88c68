use crate::index::SubFile;
use osrs_bytes::ReadExt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("group is empty")]
    Empty,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed getting last byte")]
    LastByte,
    #[error("trailer of {0} stripes does not fit the group")]
    Trailer(u8),
    #[error("negative chunk length")]
    NegativeLength,
    #[error("chunk runs past the trailer")]
    Overrun,
}

/// Splits archives into their subfiles.
pub struct Group {}

impl Group {
    /// Unpacks `input` into one subfile per id in `ids`, in the same order.
    ///
    /// Multi-file groups end with a stripe count byte, preceded by the
    /// delta-coded chunk lengths of every file in every stripe.
    pub fn unpack(input: Vec<u8>, ids: &[u32]) -> Result<Vec<SubFile>, GroupError> {
        match ids {
            [] => return Err(GroupError::Empty),
            [single] => {
                return Ok(vec![SubFile {
                    fileid: *single,
                    buffer: input,
                }])
            }
            _ => {}
        }

        let stripes = *input.last().ok_or(GroupError::LastByte)?;
        let trailer_len = stripes as usize * ids.len() * 4;
        let trailer_index = input
            .len()
            .checked_sub(trailer_len + 1)
            .ok_or(GroupError::Trailer(stripes))?;

        let mut trailer = &input[trailer_index..input.len() - 1];
        let mut chunks = Vec::with_capacity(stripes as usize * ids.len());
        let mut lens = vec![0usize; ids.len()];
        for _ in 0..stripes {
            let mut chunk_len = 0i32;
            for len in lens.iter_mut() {
                chunk_len = chunk_len.wrapping_add(trailer.read_i32()?);
                if chunk_len < 0 {
                    return Err(GroupError::NegativeLength);
                }
                chunks.push(chunk_len as usize);
                *len += chunk_len as usize;
            }
        }

        let mut files: Vec<SubFile> = ids
            .iter()
            .zip(&lens)
            .map(|(id, len)| SubFile {
                fileid: *id,
                buffer: Vec::with_capacity(*len),
            })
            .collect();

        let mut data_index = 0;
        for (i, chunk_len) in chunks.into_iter().enumerate() {
            let end = data_index + chunk_len;
            if end > trailer_index {
                return Err(GroupError::Overrun);
            }
            files[i % ids.len()]
                .buffer
                .extend_from_slice(&input[data_index..end]);
            data_index = end;
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers(files: Vec<SubFile>) -> Vec<(u32, Vec<u8>)> {
        files.into_iter().map(|f| (f.fileid, f.buffer)).collect()
    }

    #[test]
    fn test_unpack_single() {
        let actual = Group::unpack(vec![0, 1, 2, 3], &[1]).unwrap();
        assert_eq!(vec![(1, vec![0, 1, 2, 3])], buffers(actual));
    }

    #[test]
    fn test_unpack_zero_stripes() {
        let actual = Group::unpack(vec![0], &[0, 1, 3]).unwrap();
        assert_eq!(
            vec![(0, Vec::new()), (1, Vec::new()), (3, Vec::new())],
            buffers(actual)
        );
    }

    #[test]
    fn test_unpack_one_stripe() {
        let actual = Group::unpack(
            vec![
                0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 0, 0, 3, 0, 0, 0, 2, 0xFF, 0xFF, 0xFF, 0xFD, 1,
            ],
            &[0, 1, 3],
        )
        .unwrap();

        assert_eq!(
            vec![(0, vec![0, 1, 2]), (1, vec![3, 4, 5, 6, 7]), (3, vec![8, 9])],
            buffers(actual)
        );
    }

    #[test]
    fn test_unpack_multiple_stripes() {
        let actual = Group::unpack(
            vec![
                0, 1, 3, 4, 8, 9, 2, 5, 6, 7, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0,
                0, 2, 0xFF, 0xFF, 0xFF, 0xFD, 2,
            ],
            &[0, 1, 3],
        )
        .unwrap();

        assert_eq!(
            vec![(0, vec![0, 1, 2]), (1, vec![3, 4, 5, 6, 7]), (3, vec![8, 9])],
            buffers(actual)
        );
    }

    #[test]
    fn test_unpack_trailer_too_long() {
        assert!(matches!(
            Group::unpack(vec![0, 0, 9], &[0, 1]),
            Err(GroupError::Trailer(9))
        ));
    }

    #[test]
    fn test_unpack_empty_ids() {
        assert!(matches!(Group::unpack(vec![1], &[]), Err(GroupError::Empty)));
    }
}
