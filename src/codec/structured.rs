use super::{texts, Artifact, CodecError, ContentCodec, DecodeFlags, DumpOutput, ReadContext};
use crate::{
    lookup::AddressStrategy,
    parser::{FileParser, ParseError},
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

const SCHEMA_KEY: &str = "$schema";
const FILEID_KEY: &str = "$fileid";

/// JSON output of any record parser.
///
/// Unbatched records point at the item schema through `$schema`. Batched
/// records carry their logical id in `$fileid` instead, and `combine_subs`
/// wraps them into one document pointing at the batch schema.
pub struct StructuredCodec {
    name: &'static str,
    parser: Arc<dyn FileParser>,
    lookup: Box<dyn AddressStrategy>,
    flags: DecodeFlags,
}

impl StructuredCodec {
    pub fn new(
        name: &'static str,
        parser: Arc<dyn FileParser>,
        lookup: Box<dyn AddressStrategy>,
        flags: DecodeFlags,
    ) -> Self {
        Self {
            name,
            parser,
            lookup,
            flags,
        }
    }

    // separate files, since editors do not follow fragment paths
    pub fn schema_path(&self) -> String {
        format!(".schema-{}.json", self.name)
    }

    pub fn batch_schema_path(&self) -> String {
        format!(".schema-{}_batch.json", self.name)
    }

    fn record<'v>(value: &'v mut Value) -> Result<&'v mut Map<String, Value>, ParseError> {
        value
            .as_object_mut()
            .ok_or_else(|| ParseError::Invalid("structured record is not an object".to_owned()))
    }
}

#[async_trait]
impl ContentCodec for StructuredCodec {
    fn ext(&self) -> &'static str {
        "json"
    }

    fn lookup(&self) -> &dyn AddressStrategy {
        self.lookup.as_ref()
    }

    fn parser(&self) -> Option<&Arc<dyn FileParser>> {
        Some(&self.parser)
    }

    fn prepare_dump(&self, output: &dyn DumpOutput) -> Result<(), CodecError> {
        let schema = self.parser.json_schema();
        let (path, schema) = if self.flags.batched {
            let batch = json!({
                "type": "object",
                "properties": {
                    "files": { "type": "array", "items": schema }
                }
            });
            (self.batch_schema_path(), batch)
        } else {
            (self.schema_path(), schema)
        };

        debug!(mode = self.name, path = %path, "writing schema");
        output.write_file(&path, serde_json::to_string_pretty(&schema)?.as_bytes())?;
        Ok(())
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        _ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError> {
        let mut value = self.parser.read(buf, self.flags.keep_buffers)?;
        let record = Self::record(&mut value)?;

        if self.flags.batched {
            record.remove(SCHEMA_KEY);
            let fileid = match id {
                [single] => json!(single),
                _ => json!(id),
            };
            record.insert(FILEID_KEY.to_owned(), fileid);
        } else {
            record.remove(FILEID_KEY);
            record.insert(SCHEMA_KEY.to_owned(), json!(self.schema_path()));
        }

        Ok(Artifact::Text(serde_json::to_string_pretty(&value)?))
    }

    fn write(&self, file: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut value: Value = serde_json::from_slice(file)?;
        let record = Self::record(&mut value)?;
        record.remove(SCHEMA_KEY);
        record.remove(FILEID_KEY);

        Ok(self.parser.write(&value)?)
    }

    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError> {
        Ok(Artifact::Text(format!(
            "{{\"{SCHEMA_KEY}\":\"{}\",\"files\":[\n\n{}]}}",
            self.batch_schema_path(),
            texts(files)?.join("\n,\n\n")
        )))
    }
}
