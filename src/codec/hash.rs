use super::{texts, Artifact, CodecError, ContentCodec, ReadContext};
use crate::{
    constants::major,
    lookup::{AddressStrategy, NoArchiveIndex},
    parser::{FileParser, ModelHasher},
    sprite::parse_sprite,
};
use async_trait::async_trait;
use crc32fast::hash;
use std::sync::Arc;

fn json_array(files: Vec<Artifact>) -> Result<Artifact, CodecError> {
    let entries: Vec<String> = texts(files)?
        .into_iter()
        .filter(|entry| !entry.is_empty())
        .collect();
    Ok(Artifact::Text(format!("[{}]", entries.join(",\n"))))
}

/// CRC32 of every sprite frame raster, for change detection.
pub struct SpriteHashCodec {
    lookup: NoArchiveIndex,
}

impl SpriteHashCodec {
    pub fn new() -> Self {
        Self {
            lookup: NoArchiveIndex::new(major::SPRITES),
        }
    }
}

impl Default for SpriteHashCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentCodec for SpriteHashCodec {
    fn ext(&self) -> &'static str {
        "json"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        _ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let id = id.first().copied().unwrap_or_default();
        let entries: Vec<String> = parse_sprite(buf)?
            .iter()
            .enumerate()
            .map(|(sub, frame)| {
                format!(
                    "{{\"id\":{id},\"sub\":{sub},\"hash\":{}}}",
                    hash(&frame.img.data)
                )
            })
            .collect();
        Ok(Artifact::Text(entries.join(",")))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("sprite hash write"))
    }

    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        json_array(files)
    }
}

/// Per-mesh hashes of every model.
pub struct ModelHashCodec {
    lookup: NoArchiveIndex,
    models: Arc<dyn FileParser>,
    hasher: Arc<dyn ModelHasher>,
}

impl ModelHashCodec {
    pub fn new(models: Arc<dyn FileParser>, hasher: Arc<dyn ModelHasher>) -> Self {
        Self {
            lookup: NoArchiveIndex::new(major::MODELS),
            models,
            hasher,
        }
    }
}

#[async_trait]
impl ContentCodec for ModelHashCodec {
    fn ext(&self) -> &'static str {
        "json"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    fn parser(&self) -> Option<&Arc<dyn FileParser>> {
        Some(&self.models)
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        _ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let model = self.models.read(buf, false)?;
        let hashes = self
            .hasher
            .hash(&model, id.first().copied().unwrap_or_default())?;
        Ok(Artifact::Text(serde_json::to_string(&hashes)?))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("model hash write"))
    }

    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        json_array(files)
    }
}
