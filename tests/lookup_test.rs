mod common;

use rs2filetypes::{
    constants::{major, map_file},
    lookup::{
        BlacklistIndex, ChunkedIndex, IndexFileIndex, NoArchiveIndex, RootIndexFileIndex,
        SingleMinorIndex, StandardIndex, WorldmapIndex,
    },
    AddressError, AddressStrategy, LookupError, MemorySource, Reversible,
};

fn cache() -> MemorySource {
    MemorySource::new()
        .with_archive(major::ITEMS, 0, [(0, vec![0]), (5, vec![5]), (255, vec![255])])
        .with_archive(major::ITEMS, 2, [(1, vec![1])])
        .with_archive(major::FRAMES, 3, [(0, vec![]), (2, vec![]), (9, vec![])])
        .with_archive(major::FRAMES, 4, [(1, vec![])])
        .with_archive(major::SPRITES, 0, [(0, vec![])])
        .with_archive(major::SPRITES, 7, [(0, vec![])])
        .with_archive(major::SPRITES, 8, [(0, vec![])])
        .with_archive(
            major::MAPSQUARES,
            50 + 50 * 128,
            [(map_file::LOCATIONS, vec![]), (map_file::SQUARES, vec![])],
        )
        .with_archive(major::MAPSQUARES, 51 + 50 * 128, [(map_file::LOCATIONS, vec![])])
        .with_archive(major::CONFIG, 4, [(0, vec![]), (1, vec![])])
        .with_archive(major::INDEX, major::ITEMS, [(0, vec![])])
}

/// Every resolved file maps to a logical id inside the range, and back to
/// itself.
async fn resolve_inverse<L: Reversible>(lookup: &L, start: &[u32], end: &[u32]) -> Vec<Vec<u32>> {
    let source = cache();
    let files = lookup
        .logical_range_to_files(&source, start, end)
        .await
        .unwrap();

    let mut ids = Vec::new();
    for file in files {
        let file_id = file.file_id().unwrap();
        let id = lookup.file_to_logical(file_id).unwrap();
        assert_eq!(lookup.logical_dimensions(), id.len());
        assert_eq!(file_id, lookup.logical_to_file(&id).unwrap());
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn test_chunked_inverse() {
    common::setup();
    let ids = resolve_inverse(&ChunkedIndex::new(major::ITEMS), &[5], &[600]).await;
    assert_eq!(vec![vec![5], vec![255], vec![513]], ids);
}

#[tokio::test]
async fn test_standard_inverse() {
    let ids = resolve_inverse(&StandardIndex::new(major::FRAMES), &[3, 2], &[4, 0]).await;
    assert_eq!(vec![vec![3, 2], vec![3, 9]], ids);
}

#[tokio::test]
async fn test_no_archive_inverse() {
    let ids = resolve_inverse(&NoArchiveIndex::new(major::SPRITES), &[1], &[8]).await;
    assert_eq!(vec![vec![7], vec![8]], ids);
}

#[tokio::test]
async fn test_blacklist_inverse() {
    let lookup = BlacklistIndex::new(NoArchiveIndex::new(major::SPRITES), [(major::SPRITES, 7)]);
    let ids = resolve_inverse(&lookup, &[0], &[8]).await;
    assert_eq!(vec![vec![0], vec![8]], ids);
}

#[tokio::test]
async fn test_single_minor_inverse() {
    let lookup = SingleMinorIndex::new(major::CONFIG, 4);
    let ids = resolve_inverse(&lookup, &[1], &[10]).await;
    assert_eq!(vec![vec![1]], ids);
}

#[tokio::test]
async fn test_worldmap_inverse() {
    let lookup = WorldmapIndex::new(map_file::SQUARES);
    let ids = resolve_inverse(&lookup, &[0, 0], &[127, 255]).await;
    assert_eq!(vec![vec![50, 50]], ids);
}

#[tokio::test]
async fn test_index_file_inverse() {
    let ids = resolve_inverse(&IndexFileIndex, &[0], &[254]).await;
    assert_eq!(vec![vec![major::ITEMS]], ids);
}

#[tokio::test]
async fn test_root_index_resolves_without_listing() {
    let ids = resolve_inverse(&RootIndexFileIndex, &[], &[]).await;
    assert_eq!(vec![Vec::<u32>::new()], ids);
}

#[tokio::test]
async fn test_dimension_mismatch() {
    let source = cache();
    let lookup: Box<dyn AddressStrategy> = Box::new(StandardIndex::new(major::FRAMES));

    let res = lookup.logical_range_to_files(&source, &[1], &[2]).await;

    assert!(matches!(
        res,
        Err(LookupError::Address(AddressError::Dimensions {
            expected: 2,
            found: 1
        }))
    ));
}
