//! Well-known cache majors and the fixed minors/subfiles inside them.

/// Archive (major) ids of the cache.
pub mod major {
    pub const FRAMES: u32 = 0;
    pub const FRAMEMAPS: u32 = 1;
    pub const CONFIG: u32 = 2;
    pub const MAPSQUARES: u32 = 5;
    pub const OLD_MODELS: u32 = 7;
    pub const SPRITES: u32 = 8;
    pub const TEXTURES_OLD_PNG: u32 = 9;
    pub const SOUNDS: u32 = 14;
    pub const OBJECTS: u32 = 16;
    pub const ENUMS: u32 = 17;
    pub const NPCS: u32 = 18;
    pub const ITEMS: u32 = 19;
    pub const SEQUENCES: u32 = 20;
    pub const SPOTANIMS: u32 = 21;
    pub const STRUCTS: u32 = 22;
    pub const QUICKCHAT: u32 = 24;
    pub const MATERIALS: u32 = 26;
    pub const PARTICLES: u32 = 27;
    pub const MUSIC: u32 = 40;
    pub const TEXTURES_2015_PNG: u32 = 43;
    pub const TEXTURES_2015_COMPOUND_PNG: u32 = 44;
    pub const TEXTURES_2015_DDS: u32 = 45;
    pub const TEXTURES_2015_COMPOUND_PNG_MIPS: u32 = 46;
    pub const MODELS: u32 = 47;
    pub const TEXTURES_2015_COMPOUND_DDS: u32 = 50;
    pub const TEXTURES_2015_PNG_MIPS: u32 = 51;
    pub const TEXTURES_DDS: u32 = 52;
    pub const TEXTURES_PNG: u32 = 53;
    pub const TEXTURES_BMP: u32 = 54;
    pub const TEXTURES_KTX: u32 = 55;
    pub const SKELETAL_ANIMS: u32 = 56;
    pub const ACHIEVEMENTS: u32 = 57;
    /// The meta major holding every other major's reference table.
    pub const INDEX: u32 = 255;
}

/// Minors of the config major.
pub mod config_page {
    pub const MAP_UNDERLAYS: u32 = 1;
    pub const IDENTITY_KIT: u32 = 3;
    pub const MAP_OVERLAYS: u32 = 4;
    pub const PARAMS: u32 = 11;
    pub const ENVIRONMENTS: u32 = 29;
    pub const ANIMGROUPS: u32 = 32;
    pub const MAPSCENES: u32 = 34;
}

/// Subfile ids inside a mapsquare archive.
pub mod map_file {
    pub const LOCATIONS: u32 = 0;
    pub const SQUARES: u32 = 3;
    pub const SQUARES_NXT: u32 = 5;
}

/// Enum (in the enums major) listing every music track minor.
pub const MUSIC_TRACK_ENUM: u32 = 1351;

/// Number of records packed into one archive of a chunked major.
///
/// Majors without an entry hold a single record per archive.
pub fn archive_size(major: u32) -> u32 {
    match major {
        major::ITEMS | major::ENUMS | major::OBJECTS | major::SPOTANIMS => 256,
        major::NPCS | major::SEQUENCES | major::ACHIEVEMENTS => 128,
        major::STRUCTS => 32,
        _ => 1,
    }
}
