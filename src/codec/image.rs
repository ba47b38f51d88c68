use super::{Artifact, CodecError, ContentCodec, ReadContext};
use crate::{
    constants::major,
    imgutils::pixels_to_png,
    lookup::{AddressStrategy, NoArchiveIndex},
    parser::{ParseError, TextureDecoder},
    sprite::parse_sprite,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Sprites as png. Only the first frame of multi-frame sprites is kept.
pub struct SpriteCodec {
    lookup: NoArchiveIndex,
}

impl SpriteCodec {
    pub fn new() -> Self {
        Self {
            lookup: NoArchiveIndex::new(major::SPRITES),
        }
    }
}

impl Default for SpriteCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentCodec for SpriteCodec {
    fn ext(&self) -> &'static str {
        "png"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    async fn read(
        &self,
        buf: &[u8],
        _id: &[u32],
        _ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        // TODO: emit every frame once extraction can name sub-images
        let frame = parse_sprite(buf)?
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Invalid("sprite has no frames".to_owned()))?;
        Ok(Artifact::Bytes(pixels_to_png(&frame.img)?))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("sprite write"))
    }

    fn combine_subs(&self, _files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        Err(CodecError::Unsupported("sprite combine"))
    }
}

/// Textures of one texture major as png.
pub struct TextureCodec {
    lookup: NoArchiveIndex,
    decoder: Arc<dyn TextureDecoder>,
}

impl TextureCodec {
    pub fn new(major: u32, decoder: Arc<dyn TextureDecoder>) -> Self {
        Self {
            lookup: NoArchiveIndex::new(major),
            decoder,
        }
    }
}

#[async_trait]
impl ContentCodec for TextureCodec {
    fn ext(&self) -> &'static str {
        "png"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    async fn read(
        &self,
        buf: &[u8],
        _id: &[u32],
        ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let img = ctx.guard(self.decoder.decode(buf)).await?;
        Ok(Artifact::Bytes(pixels_to_png(&img)?))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("texture write"))
    }

    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        let mut files = files.into_iter();
        match (files.next(), files.next()) {
            (Some(file), None) => Ok(file),
            _ => Err(CodecError::Unsupported("texture combine of several files")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        index::FileId,
        parser::ImageData,
        source::MemorySource,
        sprite::tests::palette_sprite,
    };

    struct Flat;

    #[async_trait]
    impl TextureDecoder for Flat {
        async fn decode(&self, buf: &[u8]) -> Result<ImageData, ParseError> {
            Ok(ImageData {
                width: 1,
                height: 1,
                data: vec![buf[0], 0, 0, 255],
            })
        }
    }

    #[tokio::test]
    async fn test_sprite_first_frame_png() {
        let source = MemorySource::new();
        let ctx = ReadContext::new(&source);

        let png = SpriteCodec::new()
            .read(&palette_sprite(0), &[3], &ctx)
            .await
            .unwrap();
        let decoded = ::image::load_from_memory(png.as_bytes()).unwrap();

        assert_eq!((2, 2), (decoded.width(), decoded.height()));
    }

    #[test]
    fn test_sprite_decode_only() {
        assert!(matches!(
            SpriteCodec::new().write(&[]),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_texture_lookup_uses_own_major() {
        let codec = TextureCodec::new(major::TEXTURES_DDS, Arc::new(Flat));
        assert_eq!(
            FileId::new(major::TEXTURES_DDS, 4, 0),
            codec.lookup().logical_to_file(&[4]).unwrap()
        );

        let source = MemorySource::new();
        let png = codec.read(&[9], &[4], &ReadContext::new(&source)).await.unwrap();
        assert!(matches!(
            codec.combine_subs(vec![png.clone(), png.clone()]),
            Err(CodecError::Unsupported(_))
        ));
        assert_eq!(png.clone(), codec.combine_subs(vec![png]).unwrap());
    }
}
