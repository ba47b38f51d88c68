use super::{
    check_dimensions, check_range, AddressError, AddressStrategy, LogicalIndex, LookupError,
    Sealed,
};
use crate::{
    constants::{major, MUSIC_TRACK_ENUM},
    index::{CacheFileRef, FileId},
    parser::{FileParser, ParseError},
    source::{CacheFileSource, SourceError},
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Resolves logical ids through the value column of an enum record: every
/// row whose value lies in range points at archive `value` of the target
/// major. Used for music, whose tracks are listed by an enum rather than
/// numbered by their archives.
pub struct EnumLookup {
    enums: Arc<dyn FileParser>,
    enum_id: u32,
    target_major: u32,
}

impl EnumLookup {
    pub fn new(enums: Arc<dyn FileParser>, enum_id: u32, target_major: u32) -> Self {
        Self {
            enums,
            enum_id,
            target_major,
        }
    }

    /// The music track table.
    pub fn music(enums: Arc<dyn FileParser>) -> Self {
        Self::new(enums, MUSIC_TRACK_ENUM, major::MUSIC)
    }

    async fn values(&self, source: &dyn CacheFileSource) -> Result<Vec<i64>, LookupError> {
        let buf = source.get_file_by_id(major::ENUMS, self.enum_id).await?;
        let table = self.enums.read(&buf, false)?;
        Ok(enum_values(&table)?)
    }
}

/// The value column of the `[key, value]` rows of an int-to-int enum.
fn enum_values(table: &Value) -> Result<Vec<i64>, ParseError> {
    let rows = table
        .get("intArrayValue2")
        .and_then(|values| values.get("values"))
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::Invalid("enum has no int to int table".to_owned()))?;

    rows.iter()
        .map(|row| {
            row.get(1)
                .and_then(Value::as_i64)
                .ok_or_else(|| ParseError::Invalid(format!("malformed enum row {row}")))
        })
        .collect()
}

impl Sealed for EnumLookup {}

#[async_trait]
impl AddressStrategy for EnumLookup {
    fn major(&self) -> Option<u32> {
        Some(self.target_major)
    }

    fn logical_dimensions(&self) -> usize {
        1
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![file.minor])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 1)?;
        Err(AddressError::Irreversible("enum driven lookup"))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 1)?;
        let (start, end) = (i64::from(start[0]), i64::from(end[0]));

        let mut values: Vec<i64> = self
            .values(source)
            .await?
            .into_iter()
            .filter(|value| (start..=end).contains(value))
            .collect();
        values.sort_unstable();
        values.dedup();

        let index = source.get_cache_index(self.target_major).await?;
        let mut files = Vec::with_capacity(values.len());
        for value in values {
            // in range of two u32 bounds, so it fits
            let minor = value as u32;
            let entry = index.get(minor).ok_or(SourceError::NotFound {
                major: self.target_major,
                minor,
            })?;
            files.push(CacheFileRef::new(Arc::clone(entry), 0));
        }

        debug!(enum_id = self.enum_id, files = files.len(), "resolved enum rows");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    struct JsonEnums;

    impl FileParser for JsonEnums {
        fn read(&self, buf: &[u8], _keep_buffers: bool) -> Result<Value, ParseError> {
            Ok(serde_json::from_slice(buf)?)
        }

        fn write(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
            Ok(serde_json::to_vec(value)?)
        }

        fn json_schema(&self) -> Value {
            json!({ "type": "object" })
        }
    }

    fn source(rows: Value) -> MemorySource {
        let table = serde_json::to_vec(&json!({ "intArrayValue2": { "values": rows } })).unwrap();
        // enum 1351 is record 71 of archive 5
        MemorySource::new()
            .with_archive(major::ENUMS, 5, [(71, table)])
            .with_archive(major::MUSIC, 3, [(0, vec![])])
            .with_archive(major::MUSIC, 7, [(0, vec![])])
            .with_archive(major::MUSIC, 9, [(0, vec![])])
    }

    #[tokio::test]
    async fn test_rows_sorted_and_deduplicated() {
        let source = source(json!([[0, 9], [1, 3], [2, 9], [3, 7], [4, 100]]));
        let lookup = EnumLookup::music(Arc::new(JsonEnums));

        let files = lookup
            .logical_range_to_files(&source, &[0], &[50])
            .await
            .unwrap();
        let minors: Vec<u32> = files.iter().map(|f| f.index.minor).collect();

        assert_eq!(vec![3, 7, 9], minors);
    }

    #[tokio::test]
    async fn test_missing_archive() {
        let source = source(json!([[0, 4], [1, 7]]));
        let lookup = EnumLookup::music(Arc::new(JsonEnums));

        assert!(matches!(
            lookup.logical_range_to_files(&source, &[0], &[10]).await,
            Err(LookupError::Source(SourceError::NotFound {
                major: major::MUSIC,
                minor: 4
            }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_table() {
        let table = serde_json::to_vec(&json!({ "values": [] })).unwrap();
        let source = MemorySource::new().with_archive(major::ENUMS, 5, [(71, table)]);
        let lookup = EnumLookup::music(Arc::new(JsonEnums));

        assert!(matches!(
            lookup.logical_range_to_files(&source, &[0], &[10]).await,
            Err(LookupError::Parse(ParseError::Invalid(_)))
        ));
    }

    #[test]
    fn test_one_directional() {
        let lookup = EnumLookup::music(Arc::new(JsonEnums));

        assert_eq!(vec![12], lookup.file_to_logical(FileId::new(major::MUSIC, 12, 0)).unwrap());
        assert!(matches!(
            lookup.logical_to_file(&[12]),
            Err(AddressError::Irreversible(_))
        ));
    }
}
