//! Sprite records: palette sprites with a geometry footer, and true-colour
//! sprites flagged by the high bit of the trailing u16.

use crate::parser::{ImageData, ParseError};
use osrs_bytes::ReadExt;
use std::io::{self, Cursor};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteFrame {
    pub x: u32,
    pub y: u32,
    pub img: ImageData,
}

const FLAG_COLUMN_MAJOR: u8 = 0x1;
const FLAG_ALPHA: u8 = 0x2;

fn truncated(e: io::Error) -> ParseError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => ParseError::Truncated,
        _ => ParseError::Io(e),
    }
}

/// Borrows the next `len` bytes and moves past them.
fn take<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8], ParseError> {
    let buf: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let bytes = start
        .checked_add(len)
        .and_then(|end| buf.get(start..end))
        .ok_or(ParseError::Truncated)?;
    cursor.set_position((start + len) as u64);
    Ok(bytes)
}

fn read_u16s(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<u16>, ParseError> {
    (0..count)
        .map(|_| cursor.read_u16().map_err(truncated))
        .collect()
}

/// Decodes every frame of a sprite record. Frames with no area are skipped.
pub fn parse_sprite(buf: &[u8]) -> Result<Vec<SpriteFrame>, ParseError> {
    let mut cursor = Cursor::new(buf);
    cursor.set_position(buf.len().checked_sub(2).ok_or(ParseError::Truncated)? as u64);
    let trailer = cursor.read_u16().map_err(truncated)?;
    let count = (trailer & 0x7FFF) as usize;

    if trailer & 0x8000 == 0 {
        parse_palette_sprite(buf, count)
    } else {
        Ok(vec![parse_true_colour_sprite(buf)?])
    }
}

struct FrameGeometry {
    x: u32,
    y: u32,
    width: usize,
    height: usize,
}

fn parse_palette_sprite(buf: &[u8], count: usize) -> Result<Vec<SpriteFrame>, ParseError> {
    let footer_size = 7 + 8 * count;
    let footer = buf.len().checked_sub(footer_size).ok_or(ParseError::Truncated)?;

    let mut cursor = Cursor::new(buf);
    // max width and height at footer, unused
    cursor.set_position(footer as u64 + 4);
    let palette_len = (cursor.read_u8().map_err(truncated)? as usize)
        .checked_sub(1)
        .ok_or_else(|| ParseError::Invalid("empty sprite palette".to_owned()))?;

    let xs = read_u16s(&mut cursor, count)?;
    let ys = read_u16s(&mut cursor, count)?;
    let widths = read_u16s(&mut cursor, count)?;
    let heights = read_u16s(&mut cursor, count)?;
    let frames = (0..count).map(|i| FrameGeometry {
        x: xs[i] as u32,
        y: ys[i] as u32,
        width: widths[i] as usize,
        height: heights[i] as usize,
    });

    let palette_start = footer
        .checked_sub(3 * palette_len)
        .ok_or(ParseError::Truncated)?;
    let mut palette = buf[palette_start..footer].to_vec();
    // pure black would read as transparent
    if palette.starts_with(&[0, 0, 0]) {
        palette[2] = 1;
    }

    cursor.set_position(0);
    let mut sprites = Vec::with_capacity(count);
    for frame in frames {
        if frame.width == 0 || frame.height == 0 {
            continue;
        }

        let flags = cursor.read_u8().map_err(truncated)?;
        let size = frame.width * frame.height;
        let indices = take(&mut cursor, size)?;
        let alpha = if flags & FLAG_ALPHA != 0 {
            Some(take(&mut cursor, size)?)
        } else {
            None
        };
        if cursor.position() > palette_start as u64 {
            return Err(ParseError::Truncated);
        }

        let mut data = vec![0u8; size * 4];
        for y in 0..frame.height {
            for x in 0..frame.width {
                let src = if flags & FLAG_COLUMN_MAJOR != 0 {
                    y + x * frame.height
                } else {
                    x + y * frame.width
                };
                let colour = indices[src] as usize;
                if colour == 0 {
                    continue;
                }
                let rgb = palette
                    .get((colour - 1) * 3..colour * 3)
                    .ok_or_else(|| ParseError::Invalid(format!("palette index {colour}")))?;
                let dst = (x + y * frame.width) * 4;
                data[dst..dst + 3].copy_from_slice(rgb);
                data[dst + 3] = alpha.map_or(255, |alpha| alpha[src]);
            }
        }

        sprites.push(SpriteFrame {
            x: frame.x,
            y: frame.y,
            img: ImageData {
                width: frame.width as u32,
                height: frame.height as u32,
                data,
            },
        });
    }

    Ok(sprites)
}

/// A type byte, width and height, rgb pixels row-major and, for type 1, an
/// alpha plane.
fn parse_true_colour_sprite(buf: &[u8]) -> Result<SpriteFrame, ParseError> {
    let mut cursor = Cursor::new(buf);
    let kind = cursor.read_u8().map_err(truncated)?;
    let width = cursor.read_u16().map_err(truncated)? as usize;
    let height = cursor.read_u16().map_err(truncated)? as usize;
    let size = width * height;

    let rgb = take(&mut cursor, size * 3)?;
    let alpha = if kind & 1 != 0 {
        Some(take(&mut cursor, size)?)
    } else {
        None
    };

    let mut data = Vec::with_capacity(size * 4);
    for (i, pixel) in rgb.chunks_exact(3).enumerate() {
        data.extend_from_slice(pixel);
        data.push(alpha.map_or(255, |alpha| alpha[i]));
    }

    Ok(SpriteFrame {
        x: 0,
        y: 0,
        img: ImageData {
            width: width as u32,
            height: height as u32,
            data,
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A palette sprite of one 2x2 frame using palette colours 1 and 2.
    pub(crate) fn palette_sprite(flags: u8) -> Vec<u8> {
        let mut buf = vec![flags, 0, 1, 2, 1];
        if flags & FLAG_ALPHA != 0 {
            buf.extend_from_slice(&[0, 10, 20, 30]);
        }
        // palette: black, then red
        buf.extend_from_slice(&[0, 0, 0, 255, 0, 0]);
        // max size, palette length + 1
        buf.extend_from_slice(&[0, 2, 0, 2, 3]);
        // x, y, width, height of the one frame
        buf.extend_from_slice(&[0, 4, 0, 5, 0, 2, 0, 2]);
        buf.extend_from_slice(&[0, 1]);
        buf
    }

    #[test]
    fn test_palette_row_major() {
        let frames = parse_sprite(&palette_sprite(0)).unwrap();

        assert_eq!(1, frames.len());
        assert_eq!((4, 5), (frames[0].x, frames[0].y));
        assert_eq!(
            vec![
                0, 0, 0, 0, // transparent
                0, 0, 1, 255, // black nudged off transparent
                255, 0, 0, 255, //
                0, 0, 1, 255,
            ],
            frames[0].img.data
        );
    }

    #[test]
    fn test_palette_column_major_alpha() {
        let frames = parse_sprite(&palette_sprite(FLAG_COLUMN_MAJOR | FLAG_ALPHA)).unwrap();
        let data = &frames[0].img.data;

        // (1, 0) reads source index 2 in column-major order
        assert_eq!(&[255, 0, 0, 20], &data[4..8]);
        assert_eq!(&[0, 0, 1, 10], &data[8..12]);
    }

    #[test]
    fn test_true_colour() {
        let mut buf = vec![1, 0, 1, 0, 2];
        buf.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        buf.extend_from_slice(&[7, 8]);
        buf.extend_from_slice(&[0x80, 0x01]);

        let frames = parse_sprite(&buf).unwrap();
        assert_eq!(vec![1, 2, 3, 7, 4, 5, 6, 8], frames[0].img.data);
        assert_eq!((1, 2), (frames[0].img.width, frames[0].img.height));
    }

    #[test]
    fn test_true_colour_short_pixels() {
        // 2x2 needs 12 rgb bytes
        let buf = [0, 0, 2, 0, 2, 9, 9, 9, 9, 9, 9, 0x80, 0x01];
        assert!(matches!(parse_sprite(&buf), Err(ParseError::Truncated)));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(parse_sprite(&[0]), Err(ParseError::Truncated)));
        let mut buf = palette_sprite(0);
        buf.drain(..3);
        assert!(parse_sprite(&buf).is_err());
    }
}
