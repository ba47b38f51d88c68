//! The closed set of decode modes and how each one is built.

use crate::{
    codec::{
        BinaryCodec, CodecError, ContentCodec, DecodeFlags, ModelHashCodec, MusicCodec,
        NpcModelsCodec, SoundCodec, SpriteCodec, SpriteHashCodec, StructuredCodec, TextureCodec,
    },
    constants::{config_page, major, map_file},
    lookup::{
        AddressStrategy, BlacklistIndex, ChunkedIndex, IndexFileIndex, NoArchiveIndex,
        OldMapFile, OldWorldmapIndex, RootIndexFileIndex, SingleMinorIndex, StandardIndex,
        WorldmapIndex,
    },
    parser::{resolve_parser, FileParser, ParserKind, ParserSet},
};
use std::{fmt, str::FromStr, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mode {0:?}")]
pub struct UnknownMode(pub String);

macro_rules! json_modes {
    ($($variant:ident => $name:literal, $parser:ident, $lookup:expr;)*) => {
        /// Modes decoding one record type to JSON through its parser.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum JsonMode {
            $($variant,)*
        }

        impl JsonMode {
            pub const ALL: &'static [JsonMode] = &[$(JsonMode::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(JsonMode::$variant => $name,)*
                }
            }

            pub fn parser_kind(self) -> ParserKind {
                match self {
                    $(JsonMode::$variant => ParserKind::$parser,)*
                }
            }

            pub fn lookup(self) -> Box<dyn AddressStrategy> {
                match self {
                    $(JsonMode::$variant => Box::new($lookup),)*
                }
            }
        }
    };
}

json_modes! {
    Framemaps => "framemaps", Framemaps, ChunkedIndex::new(major::FRAMEMAPS);
    Items => "items", Item, ChunkedIndex::new(major::ITEMS);
    Enums => "enums", Enums, ChunkedIndex::new(major::ENUMS);
    Npcs => "npcs", Npc, ChunkedIndex::new(major::NPCS);
    SoundJson => "soundjson", Audio,
        BlacklistIndex::new(StandardIndex::new(major::SOUNDS), [(major::SOUNDS, 0)]);
    MusicJson => "musicjson", Audio,
        BlacklistIndex::new(StandardIndex::new(major::MUSIC), [(major::MUSIC, 0)]);
    Objects => "objects", Object, ChunkedIndex::new(major::OBJECTS);
    Achievements => "achievements", Achievement, ChunkedIndex::new(major::ACHIEVEMENTS);
    Structs => "structs", Structs, ChunkedIndex::new(major::STRUCTS);
    Sequences => "sequences", Sequences, ChunkedIndex::new(major::SEQUENCES);
    SpotAnims => "spotanims", SpotAnims, ChunkedIndex::new(major::SPOTANIMS);
    Materials => "materials", Materials, ChunkedIndex::new(major::MATERIALS);
    OldMaterials => "oldmaterials", OldMaterials, SingleMinorIndex::new(major::MATERIALS, 0);
    QuickchatCats => "quickchatcats", QuickchatCategories,
        SingleMinorIndex::new(major::QUICKCHAT, 0);
    QuickchatLines => "quickchatlines", QuickchatLines,
        SingleMinorIndex::new(major::QUICKCHAT, 1);
    Overlays => "overlays", MapsquareOverlays,
        SingleMinorIndex::new(major::CONFIG, config_page::MAP_OVERLAYS);
    IdentityKit => "identitykit", IdentityKit,
        SingleMinorIndex::new(major::CONFIG, config_page::IDENTITY_KIT);
    Params => "params", Params, SingleMinorIndex::new(major::CONFIG, config_page::PARAMS);
    Underlays => "underlays", MapsquareUnderlays,
        SingleMinorIndex::new(major::CONFIG, config_page::MAP_UNDERLAYS);
    Mapscenes => "mapscenes", Mapscenes,
        SingleMinorIndex::new(major::CONFIG, config_page::MAPSCENES);
    Environments => "environments", Environments,
        SingleMinorIndex::new(major::CONFIG, config_page::ENVIRONMENTS);
    AnimgroupConfigs => "animgroupconfigs", AnimgroupConfigs,
        SingleMinorIndex::new(major::CONFIG, config_page::ANIMGROUPS);
    Particles0 => "particles0", Particles0, SingleMinorIndex::new(major::PARTICLES, 0);
    Particles1 => "particles1", Particles1, SingleMinorIndex::new(major::PARTICLES, 1);
    MapTiles => "maptiles", MapsquareTiles, WorldmapIndex::new(map_file::SQUARES);
    MapTilesNxt => "maptiles_nxt", MapsquareTilesNxt, WorldmapIndex::new(map_file::SQUARES_NXT);
    MapLocations => "maplocations", MapsquareLocations, WorldmapIndex::new(map_file::LOCATIONS);
    MapTilesOld => "maptiles_old", MapsquareTiles, OldWorldmapIndex::new(OldMapFile::Tiles);
    MapLocationsOld => "maplocations_old", MapsquareLocations,
        OldWorldmapIndex::new(OldMapFile::Locations);
    Frames => "frames", Frames, StandardIndex::new(major::FRAMES);
    Models => "models", Models, NoArchiveIndex::new(major::MODELS);
    OldModels => "oldmodels", OldModels, NoArchiveIndex::new(major::OLD_MODELS);
    Skeletons => "skeletons", SkeletalAnim, NoArchiveIndex::new(major::SKELETAL_ANIMS);
    ProcTextures => "proctextures", ProcTexture, NoArchiveIndex::new(major::TEXTURES_OLD_PNG);
    Indices => "indices", CacheIndex, IndexFileIndex;
    RootIndex => "rootindex", RootCacheIndex, RootIndexFileIndex;
}

impl FromStr for JsonMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownMode(s.to_owned()))
    }
}

/// The texture majors, one png mode each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    OldPng,
    Png2015,
    Dds2015,
    PngMips2015,
    CompoundPng2015,
    CompoundDds2015,
    CompoundPngMips2015,
    Dds,
    Png,
    Bmp,
    Ktx,
}

impl TextureFormat {
    pub const ALL: &'static [TextureFormat] = &[
        TextureFormat::OldPng,
        TextureFormat::Png2015,
        TextureFormat::Dds2015,
        TextureFormat::PngMips2015,
        TextureFormat::CompoundPng2015,
        TextureFormat::CompoundDds2015,
        TextureFormat::CompoundPngMips2015,
        TextureFormat::Dds,
        TextureFormat::Png,
        TextureFormat::Bmp,
        TextureFormat::Ktx,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TextureFormat::OldPng => "textures_oldpng",
            TextureFormat::Png2015 => "textures_2015png",
            TextureFormat::Dds2015 => "textures_2015dds",
            TextureFormat::PngMips2015 => "textures_2015pngmips",
            TextureFormat::CompoundPng2015 => "textures_2015compoundpng",
            TextureFormat::CompoundDds2015 => "textures_2015compounddds",
            TextureFormat::CompoundPngMips2015 => "textures_2015compoundpngmips",
            TextureFormat::Dds => "textures_dds",
            TextureFormat::Png => "textures_png",
            TextureFormat::Bmp => "textures_bmp",
            TextureFormat::Ktx => "textures_ktx",
        }
    }

    pub fn major(self) -> u32 {
        match self {
            TextureFormat::OldPng => major::TEXTURES_OLD_PNG,
            TextureFormat::Png2015 => major::TEXTURES_2015_PNG,
            TextureFormat::Dds2015 => major::TEXTURES_2015_DDS,
            TextureFormat::PngMips2015 => major::TEXTURES_2015_PNG_MIPS,
            TextureFormat::CompoundPng2015 => major::TEXTURES_2015_COMPOUND_PNG,
            TextureFormat::CompoundDds2015 => major::TEXTURES_2015_COMPOUND_DDS,
            TextureFormat::CompoundPngMips2015 => major::TEXTURES_2015_COMPOUND_PNG_MIPS,
            TextureFormat::Dds => major::TEXTURES_DDS,
            TextureFormat::Png => major::TEXTURES_PNG,
            TextureFormat::Bmp => major::TEXTURES_BMP,
            TextureFormat::Ktx => major::TEXTURES_KTX,
        }
    }
}

/// Every decode mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecMode {
    Bin,
    Sprites,
    SpriteHash,
    ModelHash,
    Textures(TextureFormat),
    Sounds,
    MusicFragments,
    Music,
    NpcModels,
    Json(JsonMode),
}

impl CodecMode {
    /// All modes, in registration order.
    pub fn all() -> impl Iterator<Item = CodecMode> {
        [
            CodecMode::Bin,
            CodecMode::Sprites,
            CodecMode::SpriteHash,
            CodecMode::ModelHash,
        ]
        .into_iter()
        .chain(TextureFormat::ALL.iter().copied().map(CodecMode::Textures))
        .chain([
            CodecMode::Sounds,
            CodecMode::MusicFragments,
            CodecMode::Music,
            CodecMode::NpcModels,
        ])
        .chain(JsonMode::ALL.iter().copied().map(CodecMode::Json))
    }

    pub fn name(self) -> &'static str {
        match self {
            CodecMode::Bin => "bin",
            CodecMode::Sprites => "sprites",
            CodecMode::SpriteHash => "spritehash",
            CodecMode::ModelHash => "modelhash",
            CodecMode::Textures(format) => format.name(),
            CodecMode::Sounds => "sounds",
            CodecMode::MusicFragments => "musicfragments",
            CodecMode::Music => "music",
            CodecMode::NpcModels => "npcmodels",
            CodecMode::Json(mode) => mode.name(),
        }
    }

    /// Builds the codec of this mode. Fails when `parsers` lacks a parser or
    /// decoder the mode needs.
    pub fn build(
        self,
        flags: &DecodeFlags,
        parsers: &dyn ParserSet,
    ) -> Result<Box<dyn ContentCodec>, CodecError> {
        let parser = |kind: ParserKind| -> Result<Arc<dyn FileParser>, CodecError> {
            resolve_parser(parsers, kind).ok_or(CodecError::MissingParser(kind))
        };

        let codec: Box<dyn ContentCodec> = match self {
            CodecMode::Bin => Box::new(BinaryCodec::new()),
            CodecMode::Sprites => Box::new(SpriteCodec::new()),
            CodecMode::SpriteHash => Box::new(SpriteHashCodec::new()),
            CodecMode::ModelHash => Box::new(ModelHashCodec::new(
                parser(ParserKind::Models)?,
                parsers
                    .model_hasher()
                    .ok_or(CodecError::MissingDecoder("model hash"))?,
            )),
            CodecMode::Textures(format) => Box::new(TextureCodec::new(
                format.major(),
                parsers
                    .textures()
                    .ok_or(CodecError::MissingDecoder("texture"))?,
            )),
            CodecMode::Sounds | CodecMode::MusicFragments => {
                let major = if self == CodecMode::Sounds {
                    major::SOUNDS
                } else {
                    major::MUSIC
                };
                Box::new(SoundCodec::new(
                    major,
                    parsers.music().ok_or(CodecError::MissingDecoder("music"))?,
                ))
            }
            CodecMode::Music => Box::new(MusicCodec::new(
                parser(ParserKind::Enums)?,
                parsers.music().ok_or(CodecError::MissingDecoder("music"))?,
            )),
            CodecMode::NpcModels => Box::new(NpcModelsCodec::new(parser(ParserKind::Npc)?)),
            CodecMode::Json(mode) => Box::new(StructuredCodec::new(
                mode.name(),
                parser(mode.parser_kind())?,
                mode.lookup(),
                *flags,
            )),
        };
        Ok(codec)
    }
}

impl fmt::Display for CodecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodecMode::all()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownMode(s.to_owned()))
    }
}
