use bzip2::read::BzDecoder;
use flate2::bufread::GzDecoder;
use lzma_rs::{decompress, lzma_decompress_with_options};
use osrs_bytes::{ReadExt, WriteExt};
use std::io::{Read, Write};
use thiserror::Error;

const COMPRESSION_TYPE_NONE: u8 = 0;
const COMPRESSION_TYPE_BZIP: u8 = 1;
const COMPRESSION_TYPE_GZIP: u8 = 2;
const COMPRESSION_TYPE_LZMA: u8 = 3;

const HEADER_SIZE: usize = 5;

#[derive(Error, Debug)]
pub enum Js5CompressionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing header")]
    MissingHeader,
    #[error("length is negative: {0}")]
    NegativeLength(i32),
    #[error("uncompressed length is negative: {0}")]
    NegativeUncompressedLength(i32),
    #[error("data truncated")]
    Truncated,
    #[error("unknown compression type {0}")]
    UnknownType(u8),
    #[error("lzma error: {0}")]
    Lzma(#[from] lzma_rs::error::Error),
}

/// The JS5 container: a type byte, the payload length, the uncompressed
/// length for compressed payloads, the payload and an optional version trailer.
pub struct Js5Compression {}

impl Js5Compression {
    pub fn uncompress<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>, Js5CompressionError> {
        let mut input = input.as_ref();
        if input.len() < HEADER_SIZE {
            return Err(Js5CompressionError::MissingHeader);
        }

        let type_id = input.read_u8()?;
        let len = input.read_i32()?;
        if len < 0 {
            return Err(Js5CompressionError::NegativeLength(len));
        }
        let len = len as usize;

        if type_id == COMPRESSION_TYPE_NONE {
            return input
                .get(..len)
                .map(<[u8]>::to_vec)
                .ok_or(Js5CompressionError::Truncated);
        }

        if input.len() < len + 4 {
            return Err(Js5CompressionError::Truncated);
        }

        let uncompressed_len = input.read_i32()?;
        if uncompressed_len < 0 {
            return Err(Js5CompressionError::NegativeUncompressedLength(
                uncompressed_len,
            ));
        }
        let uncompressed_len = uncompressed_len as usize;

        // anything past `len` is the version trailer
        let payload = &input[..len];

        match type_id {
            COMPRESSION_TYPE_BZIP => decompress_bzip2(payload, uncompressed_len),
            COMPRESSION_TYPE_GZIP => decompress_gzip(payload, uncompressed_len),
            COMPRESSION_TYPE_LZMA => decompress_lzma(payload, uncompressed_len),
            _ => Err(Js5CompressionError::UnknownType(type_id)),
        }
    }

    /// Wraps `data` in an uncompressed container.
    pub fn compress_none(data: &[u8]) -> Result<Vec<u8>, Js5CompressionError> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + data.len());
        buf.write_u8(COMPRESSION_TYPE_NONE)?;
        buf.write_u32(data.len() as u32)?;
        buf.write_all(data)?;
        Ok(buf)
    }
}

// The stored stream lacks the "BZh1" magic.
fn decompress_bzip2(payload: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, Js5CompressionError> {
    let mut compressed = Vec::with_capacity(payload.len() + 4);
    compressed.extend(b"BZh1");
    compressed.extend(payload);

    let mut decompressed = vec![0; uncompressed_len];
    BzDecoder::new(compressed.as_slice()).read_exact(&mut decompressed)?;
    Ok(decompressed)
}

fn decompress_gzip(payload: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, Js5CompressionError> {
    let mut decompressed = vec![0; uncompressed_len];
    GzDecoder::new(payload).read_exact(&mut decompressed)?;
    Ok(decompressed)
}

// The stream header carries no size field, the container supplies it.
fn decompress_lzma(payload: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, Js5CompressionError> {
    let mut decompressed = Vec::with_capacity(uncompressed_len);
    lzma_decompress_with_options(
        &mut &payload[..],
        &mut decompressed,
        &decompress::Options {
            unpacked_size: decompress::UnpackedSize::UseProvided(Some(uncompressed_len as u64)),
            memlimit: None,
            allow_incomplete: false,
        },
    )?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(type_id: u8, payload: &[u8], uncompressed_len: usize) -> Vec<u8> {
        let mut buf = vec![type_id];
        buf.write_u32(payload.len() as u32).unwrap();
        buf.write_u32(uncompressed_len as u32).unwrap();
        buf.extend_from_slice(payload);
        // version trailer
        buf.extend_from_slice(&[0, 1]);
        buf
    }

    #[test]
    fn test_uncompress_none() {
        let mut buf = Js5Compression::compress_none(b"OpenRS2").unwrap();
        buf.extend_from_slice(&[0, 1]);
        assert_eq!(b"OpenRS2".to_vec(), Js5Compression::uncompress(buf).unwrap());
    }

    #[test]
    fn test_uncompress_gzip() {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
        encoder.write_all(b"OpenRS2").unwrap();
        let payload = encoder.finish().unwrap();

        let buf = container(COMPRESSION_TYPE_GZIP, &payload, 7);
        assert_eq!(b"OpenRS2".to_vec(), Js5Compression::uncompress(buf).unwrap());
    }

    #[test]
    fn test_uncompress_bzip2() {
        let expected = "OpenRS2".repeat(100).into_bytes();
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(1));
        encoder.write_all(&expected).unwrap();
        let payload = encoder.finish().unwrap();

        let buf = container(COMPRESSION_TYPE_BZIP, &payload[4..], expected.len());
        assert_eq!(expected, Js5Compression::uncompress(buf).unwrap());
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            Js5Compression::uncompress([0, 0, 0]),
            Err(Js5CompressionError::MissingHeader)
        ));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            Js5Compression::uncompress([0, 0, 0, 0, 9, 1, 2]),
            Err(Js5CompressionError::Truncated)
        ));
    }

    #[test]
    fn test_unknown_type() {
        let buf = container(9, &[1, 2, 3], 3);
        assert!(matches!(
            Js5Compression::uncompress(buf),
            Err(Js5CompressionError::UnknownType(9))
        ));
    }
}
