mod common;

use async_trait::async_trait;
use common::JsonParser;
use rs2filetypes::{
    codec::{CodecError, DecodeFlags},
    parser::{
        BuiltinParsers, ImageData, ModelHasher, MusicDecoder, ParseError, ParserKind, ParserSet,
        TextureDecoder,
    },
    registry::{CodecMode, JsonMode, TextureFormat},
    CacheFileSource, FileParser,
};
use serde_json::Value;
use std::sync::Arc;

struct Decoders;

#[async_trait]
impl TextureDecoder for Decoders {
    async fn decode(&self, _buf: &[u8]) -> Result<ImageData, ParseError> {
        Ok(ImageData {
            width: 1,
            height: 1,
            data: vec![0, 0, 0, 255],
        })
    }
}

#[async_trait]
impl MusicDecoder for Decoders {
    async fn decode(
        &self,
        _source: &dyn CacheFileSource,
        _major: u32,
        _minor: u32,
        buf: &[u8],
    ) -> Result<Vec<u8>, ParseError> {
        Ok(buf.to_vec())
    }
}

impl ModelHasher for Decoders {
    fn hash(&self, _model: &Value, id: u32) -> Result<Value, ParseError> {
        Ok(Value::from(id))
    }
}

struct FullParsers;

impl ParserSet for FullParsers {
    fn parser(&self, _kind: ParserKind) -> Option<Arc<dyn FileParser>> {
        Some(Arc::new(JsonParser))
    }

    fn textures(&self) -> Option<Arc<dyn TextureDecoder>> {
        Some(Arc::new(Decoders))
    }

    fn music(&self) -> Option<Arc<dyn MusicDecoder>> {
        Some(Arc::new(Decoders))
    }

    fn model_hasher(&self) -> Option<Arc<dyn ModelHasher>> {
        Some(Arc::new(Decoders))
    }
}

#[test]
fn test_every_mode_builds() {
    common::setup();
    let flags = DecodeFlags::default();

    for mode in CodecMode::all() {
        let codec = mode.build(&flags, &FullParsers).unwrap();
        assert_eq!(mode, mode.name().parse::<CodecMode>().unwrap());
        assert!(!codec.ext().is_empty(), "{mode} has no extension");
        if !matches!(mode, CodecMode::Bin | CodecMode::Json(_)) {
            assert!(
                matches!(codec.write(&[]), Err(CodecError::Unsupported(_))),
                "{mode} encodes"
            );
        }
    }
}

#[test]
fn test_json_mode_dimensions() {
    for mode in JsonMode::ALL {
        let expected = match mode {
            JsonMode::RootIndex => 0,
            JsonMode::Frames
            | JsonMode::SoundJson
            | JsonMode::MusicJson
            | JsonMode::MapTiles
            | JsonMode::MapTilesNxt
            | JsonMode::MapLocations
            | JsonMode::MapTilesOld
            | JsonMode::MapLocationsOld => 2,
            _ => 1,
        };
        assert_eq!(expected, mode.lookup().logical_dimensions(), "{}", mode.name());
    }
}

#[test]
fn test_textures_use_their_major() {
    for format in TextureFormat::ALL {
        let codec = CodecMode::Textures(*format)
            .build(&DecodeFlags::default(), &FullParsers)
            .unwrap();
        assert_eq!(Some(format.major()), codec.lookup().major());
        assert_eq!("png", codec.ext());
    }
}

#[test]
fn test_missing_decoders() {
    let flags = DecodeFlags::default();

    for mode in [CodecMode::Music, CodecMode::ModelHash, CodecMode::NpcModels] {
        assert!(matches!(
            mode.build(&flags, &BuiltinParsers),
            Err(CodecError::MissingParser(_))
        ));
    }
    assert!(matches!(
        CodecMode::Sounds.build(&flags, &BuiltinParsers),
        Err(CodecError::MissingDecoder(_))
    ));
    assert!(CodecMode::Json(JsonMode::Indices)
        .build(&flags, &BuiltinParsers)
        .is_ok());
}
