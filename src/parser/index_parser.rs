use super::{FileParser, ParseError};
use crate::{
    js5_index::Js5Index,
    js5_masterindex::{Js5MasterIndex, MasterIndexFormat},
};
use serde_json::{json, Value};

/// A JS5 reference table as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexFileParser;

impl FileParser for IndexFileParser {
    fn read(&self, buf: &[u8], _keep_buffers: bool) -> Result<Value, ParseError> {
        Ok(serde_json::to_value(Js5Index::read(buf)?)?)
    }

    fn write(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
        let index: Js5Index = serde_json::from_value(value.clone())?;
        Ok(index.write()?)
    }

    fn json_schema(&self) -> Value {
        let file = json!({
            "type": "object",
            "properties": { "name_hash": { "type": "integer" } },
            "required": ["name_hash"]
        });
        let group = json!({
            "type": "object",
            "properties": {
                "name_hash": { "type": "integer" },
                "version": { "type": "integer" },
                "checksum": { "type": "integer" },
                "uncompressed_checksum": { "type": "integer" },
                "length": { "type": "integer" },
                "uncompressed_length": { "type": "integer" },
                "digest": { "type": "array", "items": { "type": "integer" } },
                "files": { "type": "object", "additionalProperties": file }
            }
        });

        json!({
            "type": "object",
            "properties": {
                "protocol": { "type": "integer", "minimum": 5, "maximum": 7 },
                "version": { "type": "integer" },
                "has_names": { "type": "boolean" },
                "has_digests": { "type": "boolean" },
                "has_lengths": { "type": "boolean" },
                "has_uncompressed_checksums": { "type": "boolean" },
                "groups": { "type": "object", "additionalProperties": group }
            },
            "required": ["protocol", "groups"]
        })
    }
}

/// The master index at (255, 255) as JSON.
#[derive(Clone, Copy, Debug)]
pub struct RootIndexParser {
    format: MasterIndexFormat,
}

impl RootIndexParser {
    pub fn new(format: MasterIndexFormat) -> Self {
        Self { format }
    }
}

impl Default for RootIndexParser {
    fn default() -> Self {
        Self::new(MasterIndexFormat::Versioned)
    }
}

impl FileParser for RootIndexParser {
    fn read(&self, buf: &[u8], _keep_buffers: bool) -> Result<Value, ParseError> {
        Ok(serde_json::to_value(Js5MasterIndex::read(buf, self.format)?)?)
    }

    fn write(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
        let mut index: Js5MasterIndex = serde_json::from_value(value.clone())?;
        index.format = self.format;
        Ok(index.write()?)
    }

    fn json_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": { "enum": ["original", "versioned", "digests", "lengths"] },
                "entries": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "version": { "type": "integer" },
                            "checksum": { "type": "integer" },
                            "groups": { "type": "integer" },
                            "total_uncompressed_length": { "type": "integer" },
                            "digest": {
                                "oneOf": [
                                    { "type": "null" },
                                    { "type": "array", "items": { "type": "integer" } }
                                ]
                            }
                        }
                    }
                }
            },
            "required": ["entries"]
        })
    }
}
