use crate::{
    codec::{Artifact, CodecError, ContentCodec, DecodeFlags, DumpOutput, ReadContext},
    index::{CacheFileRef, FileId, SubFile},
    lookup::LogicalIndex,
    parser::ParserSet,
    registry::CodecMode,
    source::CacheFileSource,
};
use serde::Deserialize;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid range {0:?}")]
    InvalidRange(String),
}

/// An inclusive range of logical ids.
///
/// Written `start[-end]`, with `.` between the components of an id, so
/// `50.50-52.53` spans map squares (50, 50) to (52, 53).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalRange {
    pub start: LogicalIndex,
    pub end: LogicalIndex,
}

impl LogicalRange {
    pub fn new(start: LogicalIndex, end: LogicalIndex) -> Self {
        Self { start, end }
    }

    /// The whole id space of a `dims` dimensional strategy.
    pub fn all(dims: usize) -> Self {
        Self::new(vec![0; dims], vec![u32::MAX; dims])
    }

    /// Several ranges separated by `,`.
    pub fn parse_list(s: &str) -> Result<Vec<LogicalRange>, ExtractError> {
        s.split(',').map(str::parse).collect()
    }
}

fn parse_id(s: &str, range: &str) -> Result<LogicalIndex, ExtractError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split('.')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| ExtractError::InvalidRange(range.to_owned()))
        })
        .collect()
}

impl FromStr for LogicalRange {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = match s.split_once('-') {
            Some((start, end)) => (parse_id(start, s)?, parse_id(end, s)?),
            None => {
                let id = parse_id(s, s)?;
                (id.clone(), id)
            }
        };

        if start.len() != end.len() {
            return Err(ExtractError::InvalidRange(s.to_owned()));
        }
        Ok(Self::new(start, end))
    }
}

impl fmt::Display for LogicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |id: &[u32]| {
            id.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(".")
        };
        write!(f, "{}-{}", join(&self.start), join(&self.end))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub flags: DecodeFlags,
    /// Artifacts per batch file when batched, unbounded when `None`.
    pub batch_limit: Option<usize>,
    /// Log and skip files that fail to read instead of aborting.
    pub skip_errors: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files_read: usize,
    pub files_written: usize,
    pub skipped: usize,
}

/// Writes every dumped file into one directory.
pub struct DirectoryOutput {
    root: PathBuf,
}

impl DirectoryOutput {
    pub fn create<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DumpOutput for DirectoryOutput {
    fn write_file(&self, name: &str, data: &[u8]) -> io::Result<()> {
        fs::write(self.root.join(name), data)
    }
}

fn file_name(mode: CodecMode, id: &[u32], ext: &str) -> String {
    if id.is_empty() {
        return format!("{mode}.{ext}");
    }
    let id: Vec<String> = id.iter().map(u32::to_string).collect();
    format!("{mode}-{}.{ext}", id.join("_"))
}

struct Batch {
    first: Option<LogicalIndex>,
    files: Vec<Artifact>,
}

impl Batch {
    fn new() -> Self {
        Self {
            first: None,
            files: Vec::new(),
        }
    }

    fn push(&mut self, id: LogicalIndex, artifact: Artifact) {
        self.first.get_or_insert(id);
        self.files.push(artifact);
    }

    fn flush(
        &mut self,
        mode: CodecMode,
        codec: &dyn ContentCodec,
        output: &dyn DumpOutput,
    ) -> Result<bool, ExtractError> {
        let Some(first) = self.first.take() else {
            return Ok(false);
        };
        let files = std::mem::take(&mut self.files);
        let count = files.len();

        let first: Vec<String> = first.iter().map(u32::to_string).collect();
        let name = format!("{mode}-{}.batch.{}", first.join("_"), codec.ext());
        output.write_file(&name, codec.combine_subs(files)?.as_bytes())?;
        debug!(name = %name, files = count, "wrote batch");
        Ok(true)
    }
}

/// The subfiles of the archive last fetched, reused while consecutive files
/// share it.
struct ArchiveCache {
    key: Option<(u32, u32)>,
    files: Vec<SubFile>,
}

impl ArchiveCache {
    async fn get(
        &mut self,
        ctx: &ReadContext<'_>,
        file: &CacheFileRef,
    ) -> Result<&[SubFile], CodecError> {
        let key = (file.index.major, file.index.minor);
        if self.key != Some(key) {
            self.key = None;
            self.files = ctx.get_file_archive(&file.index).await?;
            self.key = Some(key);
        }
        Ok(&self.files)
    }
}

async fn read_file(
    codec: &dyn ContentCodec,
    ctx: &ReadContext<'_>,
    archives: &mut ArchiveCache,
    file: &CacheFileRef,
) -> Result<(LogicalIndex, Artifact), CodecError> {
    let subid = file.subid().ok_or(crate::source::SourceError::NotFound {
        major: file.index.major,
        minor: file.index.minor,
    })?;
    let file_id = FileId::new(file.index.major, file.index.minor, subid);
    let id = codec.lookup().file_to_logical(file_id)?;

    let subfiles = archives.get(ctx, file).await?;
    let buf = subfiles
        .get(file.subindex)
        .map(|subfile| subfile.buffer.as_slice())
        .ok_or(crate::source::SourceError::MissingSubfile(file_id))?;

    let artifact = ctx.guard(codec.read(buf, &id, ctx)).await?;
    Ok((id, artifact))
}

/// Decodes every file of `ranges` with the codec of `mode`, writing the
/// artifacts, or batches of them, to `output`.
pub async fn extract_files(
    mode: CodecMode,
    parsers: &dyn ParserSet,
    ctx: &ReadContext<'_>,
    ranges: &[LogicalRange],
    output: &dyn DumpOutput,
    options: &ExtractOptions,
) -> Result<ExtractSummary, ExtractError> {
    let codec = mode.build(&options.flags, parsers)?;
    codec.prepare_dump(output)?;

    let mut summary = ExtractSummary::default();
    for range in ranges {
        let mut files = codec.resolve(ctx, &range.start, &range.end).await?;
        files.sort_by_key(|file| (file.index.major, file.index.minor, file.subindex));
        info!(mode = %mode, range = %range, files = files.len(), "extracting");

        let mut archives = ArchiveCache {
            key: None,
            files: Vec::new(),
        };
        let mut batch = Batch::new();
        for file in &files {
            let (id, artifact) = match read_file(codec.as_ref(), ctx, &mut archives, file).await {
                Ok(read) => read,
                Err(e) if options.skip_errors && !ctx.is_expired() => {
                    warn!(
                        major = file.index.major,
                        minor = file.index.minor,
                        subindex = file.subindex,
                        error = %e,
                        "skipping file"
                    );
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            summary.files_read += 1;

            if options.flags.batched {
                batch.push(id, artifact);
                if options.batch_limit.map_or(false, |limit| batch.files.len() >= limit)
                    && batch.flush(mode, codec.as_ref(), output)?
                {
                    summary.files_written += 1;
                }
            } else {
                output.write_file(&file_name(mode, &id, codec.ext()), artifact.as_bytes())?;
                summary.files_written += 1;
            }
        }

        if batch.flush(mode, codec.as_ref(), output)? {
            summary.files_written += 1;
        }
    }

    info!(
        mode = %mode,
        read = summary.files_read,
        written = summary.files_written,
        skipped = summary.skipped,
        "extraction done"
    );
    Ok(summary)
}

/// Resolves `range` with the codec of `mode` without decoding anything.
pub async fn resolve_range(
    mode: CodecMode,
    parsers: &dyn ParserSet,
    source: &dyn CacheFileSource,
    range: &LogicalRange,
) -> Result<Vec<FileId>, ExtractError> {
    let codec = mode.build(&DecodeFlags::default(), parsers)?;
    let ctx = ReadContext::new(source);
    Ok(codec
        .resolve(&ctx, &range.start, &range.end)
        .await?
        .iter()
        .filter_map(CacheFileRef::file_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranges() {
        assert_eq!(
            vec![
                LogicalRange::new(vec![5], vec![5]),
                LogicalRange::new(vec![50, 50], vec![52, 53]),
            ],
            LogicalRange::parse_list("5,50.50-52.53").unwrap()
        );
        assert_eq!(
            LogicalRange::new(vec![], vec![]),
            "".parse::<LogicalRange>().unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_mismatched() {
        assert!("1.2-3".parse::<LogicalRange>().is_err());
        assert!("x-3".parse::<LogicalRange>().is_err());
    }

    #[test]
    fn test_all() {
        let range = LogicalRange::all(2);
        assert_eq!(vec![0, 0], range.start);
        assert_eq!(vec![u32::MAX, u32::MAX], range.end);
    }

    #[test]
    fn test_options_from_json() {
        let options: ExtractOptions =
            serde_json::from_str(r#"{"flags":{"batched":true},"batch_limit":10}"#).unwrap();

        assert!(options.flags.batched);
        assert!(!options.flags.keep_buffers);
        assert_eq!(Some(10), options.batch_limit);
        assert!(!options.skip_errors);
    }

    #[test]
    fn test_file_names() {
        let mode = CodecMode::Json(crate::registry::JsonMode::MapTiles);
        assert_eq!("maptiles-50_49.json", file_name(mode, &[50, 49], "json"));
        assert_eq!("bin.bin", file_name(CodecMode::Bin, &[], "bin"));
    }
}
