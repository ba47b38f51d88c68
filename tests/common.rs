#![allow(dead_code)]

use osrs_bytes::WriteExt;
use rs2filetypes::{
    codec::DumpOutput,
    js5_compression::Js5Compression,
    parser::{ParseError, ParserKind, ParserSet},
    FileParser,
};
use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    fs, io,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn setup() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Records stored as JSON text.
pub struct JsonParser;

impl FileParser for JsonParser {
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

/// Every record kind parsed as JSON.
pub struct JsonParsers;

impl ParserSet for JsonParsers {
    fn parser(&self, _kind: ParserKind) -> Option<Arc<dyn FileParser>> {
        Some(Arc::new(JsonParser))
    }
}

#[derive(Default)]
pub struct MemoryOutput {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryOutput {
    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn json(&self, name: &str) -> Value {
        serde_json::from_slice(&self.get(name).unwrap()).unwrap()
    }
}

impl DumpOutput for MemoryOutput {
    fn write_file(&self, name: &str, data: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_owned(), data.to_vec());
        Ok(())
    }
}

/// Packs `files` into a single-stripe group.
pub fn pack_group(files: &[&[u8]]) -> Vec<u8> {
    if let [single] = files {
        return single.to_vec();
    }

    let mut buf: Vec<u8> = files.concat();
    let mut prev = 0i32;
    for file in files {
        let len = file.len() as i32;
        buf.write_i32(len - prev).unwrap();
        prev = len;
    }
    buf.push(1);
    buf
}

pub fn write_group(root: &Path, archive: u8, group: u32, data: &[u8]) {
    let dir = root.join(archive.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{group}.dat")), Js5Compression::compress_none(data).unwrap()).unwrap();
}
