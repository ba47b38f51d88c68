use crate::parser::ImageData;
use image::{
    error::{ParameterError, ParameterErrorKind},
    ImageError, ImageFormat, RgbaImage,
};
use std::io::Cursor;

/// Encodes an RGBA raster as a png file.
pub fn pixels_to_png(img: &ImageData) -> Result<Vec<u8>, ImageError> {
    let raster = RgbaImage::from_raw(img.width, img.height, img.data.clone()).ok_or_else(|| {
        ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
    })?;

    let mut buf = Vec::new();
    raster.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_signature() {
        let img = ImageData {
            width: 2,
            height: 1,
            data: vec![255, 0, 0, 255, 0, 0, 255, 128],
        };

        let png = pixels_to_png(&img).unwrap();
        assert_eq!(b"\x89PNG\r\n\x1a\n", &png[..8]);

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(img.data, decoded.into_raw());
    }

    #[test]
    fn test_dimension_mismatch() {
        let img = ImageData {
            width: 2,
            height: 2,
            data: vec![0; 4],
        };
        assert!(pixels_to_png(&img).is_err());
    }
}
