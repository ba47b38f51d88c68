use super::{Artifact, CodecError, ContentCodec, ReadContext};
use crate::lookup::{AddressStrategy, RawIndex};
use async_trait::async_trait;

/// Files as stored, addressed by their physical coordinate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec {
    lookup: RawIndex,
}

impl BinaryCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentCodec for BinaryCodec {
    fn ext(&self) -> &'static str {
        "bin"
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
        Ok(Artifact::Bytes(buf.to_vec()))
    }

    fn write(&self, file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(file.to_vec())
    }

    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        Ok(Artifact::Bytes(
            files.into_iter().flat_map(Artifact::into_bytes).collect(),
        ))
    }
}
