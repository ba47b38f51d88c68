//! Content parsers and decoders supplied by the embedding application.
//!
//! The binary layouts of items, npcs, models and friends live outside this
//! crate. Codecs reach them through a [`ParserSet`], which only has to provide
//! the parsers for the modes it wants to decode. The cache's own index formats
//! are parsed in-crate and always available.

use crate::{
    js5_index::Js5IndexError, js5_masterindex::Js5MasterIndexError, source::CacheFileSource,
    source::SourceError,
};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt, sync::Arc};
use thiserror::Error;

pub use self::index_parser::{IndexFileParser, RootIndexParser};

pub mod index_parser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("data truncated")]
    Truncated,
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("reference table error: {0}")]
    Index(#[from] Js5IndexError),
    #[error("master index error: {0}")]
    MasterIndex(#[from] Js5MasterIndexError),
}

/// A two-way binary <-> JSON parser for one record type.
pub trait FileParser: Send + Sync {
    /// Decodes one record. With `keep_buffers` embedded byte spans are kept
    /// raw instead of being decoded further.
    fn read(&self, buf: &[u8], keep_buffers: bool) -> Result<Value, ParseError>;
    fn write(&self, value: &Value) -> Result<Vec<u8>, ParseError>;
    /// JSON schema of the values `read` produces.
    fn json_schema(&self) -> Value;
}

/// Every record parser a structured mode can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParserKind {
    Framemaps,
    Item,
    Enums,
    Npc,
    Audio,
    Object,
    Achievement,
    Structs,
    Sequences,
    SpotAnims,
    Materials,
    OldMaterials,
    QuickchatCategories,
    QuickchatLines,
    MapsquareOverlays,
    IdentityKit,
    Params,
    MapsquareUnderlays,
    Mapscenes,
    Environments,
    AnimgroupConfigs,
    Particles0,
    Particles1,
    MapsquareTiles,
    MapsquareTilesNxt,
    MapsquareLocations,
    Frames,
    Models,
    OldModels,
    SkeletalAnim,
    ProcTexture,
    CacheIndex,
    RootCacheIndex,
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A decoded RGBA raster, four bytes per pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait TextureDecoder: Send + Sync {
    async fn decode(&self, buf: &[u8]) -> Result<ImageData, ParseError>;
}

/// Turns a music or sound record into an ogg stream. Track records only list
/// their chunks, so the decoder may fetch further files from `source`.
#[async_trait]
pub trait MusicDecoder: Send + Sync {
    async fn decode(
        &self,
        source: &dyn CacheFileSource,
        major: u32,
        minor: u32,
        buf: &[u8],
    ) -> Result<Vec<u8>, ParseError>;
}

/// Per-mesh hashes of a decoded model.
pub trait ModelHasher: Send + Sync {
    fn hash(&self, model: &Value, id: u32) -> Result<Value, ParseError>;
}

pub trait ParserSet: Send + Sync {
    fn parser(&self, _kind: ParserKind) -> Option<Arc<dyn FileParser>> {
        None
    }

    fn textures(&self) -> Option<Arc<dyn TextureDecoder>> {
        None
    }

    fn music(&self) -> Option<Arc<dyn MusicDecoder>> {
        None
    }

    fn model_hasher(&self) -> Option<Arc<dyn ModelHasher>> {
        None
    }
}

/// Only the parsers implemented in this crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinParsers;

impl ParserSet for BuiltinParsers {
    fn parser(&self, kind: ParserKind) -> Option<Arc<dyn FileParser>> {
        match kind {
            ParserKind::CacheIndex => Some(Arc::new(IndexFileParser)),
            ParserKind::RootCacheIndex => Some(Arc::new(RootIndexParser::default())),
            _ => None,
        }
    }
}

/// `kind` from `parsers`, falling back to the built-in ones.
pub fn resolve_parser(parsers: &dyn ParserSet, kind: ParserKind) -> Option<Arc<dyn FileParser>> {
    parsers
        .parser(kind)
        .or_else(|| BuiltinParsers.parser(kind))
}
