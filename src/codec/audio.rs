use super::{Artifact, CodecError, ContentCodec, ReadContext};
use crate::{
    constants::major,
    lookup::{AddressStrategy, BlacklistIndex, EnumLookup, NoArchiveIndex},
    parser::{FileParser, MusicDecoder},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Sound or music fragment records as ogg. Archive 0 of the major holds no
/// fragment and is skipped.
pub struct SoundCodec {
    major: u32,
    lookup: BlacklistIndex<NoArchiveIndex>,
    decoder: Arc<dyn MusicDecoder>,
}

impl SoundCodec {
    pub fn new(major: u32, decoder: Arc<dyn MusicDecoder>) -> Self {
        Self {
            major,
            lookup: BlacklistIndex::new(NoArchiveIndex::new(major), [(major, 0)]),
            decoder,
        }
    }
}

#[async_trait]
impl ContentCodec for SoundCodec {
    fn ext(&self) -> &'static str {
        "ogg"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let minor = id.first().copied().unwrap_or_default();
        let ogg = ctx
            .guard(self.decoder.decode(ctx, self.major, minor, buf))
            .await?;
        Ok(Artifact::Bytes(ogg))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("sound write"))
    }

    fn combine_subs(&self, _files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        Err(CodecError::Unsupported("sound combine"))
    }
}

/// Music tracks as ogg, numbered by the music track enum.
pub struct MusicCodec {
    lookup: EnumLookup,
    decoder: Arc<dyn MusicDecoder>,
}

impl MusicCodec {
    pub fn new(enums: Arc<dyn FileParser>, decoder: Arc<dyn MusicDecoder>) -> Self {
        Self {
            lookup: EnumLookup::music(enums),
            decoder,
        }
    }
}

#[async_trait]
impl ContentCodec for MusicCodec {
    fn ext(&self) -> &'static str {
        "ogg"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let minor = id.first().copied().unwrap_or_default();
        let ogg = ctx
            .guard(self.decoder.decode(ctx, major::MUSIC, minor, buf))
            .await?;
        Ok(Artifact::Bytes(ogg))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("music write"))
    }

    fn combine_subs(&self, _files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        Err(CodecError::Unsupported("music combine"))
    }
}
