use super::{texts, Artifact, CodecError, ContentCodec, ReadContext};
use crate::{
    constants::major,
    lookup::{AddressStrategy, ChunkedIndex},
    parser::FileParser,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// The model list of every npc: `{id, size, name, models}`.
pub struct NpcModelsCodec {
    lookup: ChunkedIndex,
    npcs: Arc<dyn FileParser>,
}

impl NpcModelsCodec {
    pub fn new(npcs: Arc<dyn FileParser>) -> Self {
        Self {
            lookup: ChunkedIndex::new(major::NPCS),
            npcs,
        }
    }
}

fn field_or(npc: &Value, name: &str, default: Value) -> Value {
    npc.get(name)
        .filter(|value| !value.is_null())
        .cloned()
        .unwrap_or(default)
}

#[async_trait]
impl ContentCodec for NpcModelsCodec {
    fn ext(&self) -> &'static str {
        "json"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        &self.lookup
    }

    fn parser(&self) -> Option<&Arc<dyn FileParser>> {
        Some(&self.npcs)
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        _ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let npc = self.npcs.read(buf, false)?;
        let summary = json!({
            "id": id.first().copied().unwrap_or_default(),
            "size": field_or(&npc, "boundSize", json!(1)),
            "name": field_or(&npc, "name", json!("")),
            "models": field_or(&npc, "models", json!([])),
        });
        Ok(Artifact::Text(serde_json::to_string_pretty(&summary)?))
    }

    fn write(&self, _file: &[u8]) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported("npc model summary write"))
    }

    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        Ok(Artifact::Text(format!("[{}]", texts(files)?.join(",\n"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::ParseError, source::MemorySource};

    struct Npcs;

    impl FileParser for Npcs {
        fn read(&self, buf: &[u8], _keep_buffers: bool) -> Result<Value, ParseError> {
            Ok(serde_json::from_slice(buf)?)
        }

        fn write(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
            Ok(serde_json::to_vec(value)?)
        }

        fn json_schema(&self) -> Value {
            json!({})
        }
    }

    #[tokio::test]
    async fn test_defaults_for_missing_fields() {
        let source = MemorySource::new();
        let ctx = ReadContext::new(&source);
        let codec = NpcModelsCodec::new(Arc::new(Npcs));

        let full = codec
            .read(
                br#"{"name":"Guard","boundSize":2,"models":[10,11],"combat":21}"#,
                &[3],
                &ctx,
            )
            .await
            .unwrap();
        let bare = codec.read(br#"{"name":null}"#, &[4], &ctx).await.unwrap();

        let full: Value = serde_json::from_str(full.as_text().unwrap()).unwrap();
        let bare: Value = serde_json::from_str(bare.as_text().unwrap()).unwrap();
        assert_eq!(
            json!({ "id": 3, "size": 2, "name": "Guard", "models": [10, 11] }),
            full
        );
        assert_eq!(json!({ "id": 4, "size": 1, "name": "", "models": [] }), bare);
    }
}
