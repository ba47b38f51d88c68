//! Content codecs: an address strategy paired with the decode, encode and
//! merge operations of one kind of content.

use crate::{
    index::{CacheFileRef, CacheIndexFile, IndexEntry, SubFile},
    lookup::{AddressError, AddressStrategy, LookupError},
    parser::{FileParser, ParseError, ParserKind},
    source::{CacheFileSource, SourceError},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, future::Future, io, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

pub use self::{
    audio::{MusicCodec, SoundCodec},
    binary::BinaryCodec,
    hash::{ModelHashCodec, SpriteHashCodec},
    image::{SpriteCodec, TextureCodec},
    structured::StructuredCodec,
    summary::NpcModelsCodec,
};

pub mod audio;
pub mod binary;
pub mod hash;
pub mod image;
pub mod structured;
pub mod summary;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    #[error("no parser for {0}")]
    MissingParser(ParserKind),
    #[error("no {0} decoder")]
    MissingDecoder(&'static str),
    #[error("expected {0} artifacts")]
    ArtifactKind(&'static str),
    #[error("address error: {0}")]
    Address(#[from] AddressError),
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] ::image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// The decoded form of one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    Text(String),
    Bytes(Vec<u8>),
}

impl Artifact {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Text(text) => text.as_bytes(),
            Artifact::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Artifact::Text(text) => text.into_bytes(),
            Artifact::Bytes(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Text(text) => Some(text),
            Artifact::Bytes(_) => None,
        }
    }
}

/// Joins text artifacts, rejecting binary ones.
pub(crate) fn texts(files: Vec<Artifact>) -> Result<Vec<String>, CodecError> {
    files
        .into_iter()
        .map(|file| match file {
            Artifact::Text(text) => Ok(text),
            Artifact::Bytes(_) => Err(CodecError::ArtifactKind("text")),
        })
        .collect()
}

/// Mode flags, from the `name => value` map callers pass around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeFlags {
    pub batched: bool,
    #[serde(rename = "keepbuffers")]
    pub keep_buffers: bool,
}

impl DecodeFlags {
    /// A flag is set only by the value `"true"`.
    pub fn from_map(flags: &HashMap<String, String>) -> Self {
        let set = |name: &str| flags.get(name).map_or(false, |value| value == "true");
        Self {
            batched: set("batched"),
            keep_buffers: set("keepbuffers"),
        }
    }
}

/// Where `prepare_dump` and extraction put their files.
pub trait DumpOutput: Send + Sync {
    fn write_file(&self, name: &str, data: &[u8]) -> io::Result<()>;
}

/// The source a read runs against, bounded by a cancellation token and an
/// optional deadline. Every fetch made through it, including the nested ones
/// of lookups and decoders, fails once either fires.
#[derive(Clone)]
pub struct ReadContext<'a> {
    source: &'a dyn CacheFileSource,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl<'a> ReadContext<'a> {
    pub fn new(source: &'a dyn CacheFileSource) -> Self {
        Self {
            source,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn source(&self) -> &'a dyn CacheFileSource {
        self.source
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether cancellation or the deadline has already fired.
    pub fn is_expired(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Runs `fut` unless cancellation or the deadline comes first.
    pub async fn guard<T, E, F>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<SourceError>,
    {
        let run = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(SourceError::Cancelled.into()),
                res = fut => res,
            }
        };

        match self.deadline {
            Some(deadline) => timeout_at(deadline, run)
                .await
                .unwrap_or_else(|_| Err(SourceError::DeadlineExceeded.into())),
            None => run.await,
        }
    }
}

#[async_trait]
impl<'a> CacheFileSource for ReadContext<'a> {
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
        self.guard(self.source.get_cache_index(major)).await
    }

    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
        self.guard(self.source.get_file_archive(index)).await
    }
}

#[async_trait]
pub trait ContentCodec: Send + Sync {
    /// File extension of the artifacts, without the dot.
    fn ext(&self) -> &'static str;

    fn lookup(&self) -> &dyn AddressStrategy;

    fn parser(&self) -> Option<&Arc<dyn FileParser>> {
        None
    }

    /// Publishes auxiliary files, once, before any artifact is written.
    fn prepare_dump(&self, _output: &dyn DumpOutput) -> Result<(), CodecError> {
        Ok(())
    }

    async fn read(
        &self,
        buf: &[u8],
        id: &[u32],
        ctx: &ReadContext<'_>,
    ) -> Result<Artifact, CodecError>;

    fn write(&self, file: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Merges the artifacts of the files of one range into one.
    fn combine_subs(&self, files: Vec<Artifact>) -> Result<Artifact, CodecError>;

    /// Convenience for callers that only want the address resolution.
    async fn resolve(
        &self,
        ctx: &ReadContext<'_>,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, CodecError> {
        let lookup = self.lookup();
        Ok(ctx
            .guard(lookup.logical_range_to_files(ctx, start, end))
            .await?)
    }
}
