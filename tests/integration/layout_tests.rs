//! On-disk layouts written directory by directory.
//!
//! Tests verify:
//! - Tiled pages read whole and through windows crossing tile edges
//! - Separate sample planes read as channels, whole and windowed
//! - Reduced-resolution pages stay out of every scene
//! - A broken directory chain keeps the pages read so far and warns
//! - BigTIFF files open and read like classic ones

use bioimage_tiff::{ImageReader, PixelType, ReaderConfig, Selection, TiffReader};

use super::test_utils::{build_raw_tiff, init_tracing, raw_value, RawFile, RawPage};

fn open(pages: &[RawPage], file: RawFile, config: ReaderConfig) -> TiffReader {
    TiffReader::from_bytes(build_raw_tiff(pages, file), config).unwrap()
}

// =============================================================================
// Tiles
// =============================================================================

#[test]
fn test_tiled_page() {
    init_tracing();
    let pages = [RawPage::new(40, 24).tiles(16, 16)];
    let mut reader = open(&pages, RawFile::default(), ReaderConfig::default());

    assert_eq!(reader.shape(), [1, 1, 1, 24, 40]);
    assert_eq!(reader.dtype(), PixelType::U8);

    let block = reader.get_data("YX", &Selection::new()).unwrap();
    let array = block.as_array::<u8>().unwrap();
    for (y, x) in [(0, 0), (15, 16), (23, 39), (20, 33)] {
        assert_eq!(array[&[y, x][..]], raw_value(0, y, x, 0));
    }
}

#[test]
fn test_tiled_window_crosses_tiles() {
    let pages = [RawPage::new(40, 24).tiles(16, 16)];
    let mut reader = open(&pages, RawFile::default(), ReaderConfig::default());

    let selection = Selection::new().y(10..20).x(14..35);
    let block = reader.get_data("YX", &selection).unwrap();
    assert_eq!(block.shape(), &[10, 21]);

    let array = block.as_array::<u8>().unwrap();
    for y in 0..10 {
        for x in 0..21 {
            assert_eq!(array[&[y, x][..]], raw_value(0, y + 10, x + 14, 0));
        }
    }
}

// =============================================================================
// Separate Sample Planes
// =============================================================================

#[test]
fn test_planar_separate_strips() {
    let pages = [RawPage::new(5, 4).rgb().planar().strips(2)];
    let mut reader = open(&pages, RawFile::default(), ReaderConfig::default());

    assert_eq!(reader.shape(), [1, 3, 1, 4, 5]);

    let block = reader.get_full_data().unwrap();
    assert_eq!(block.len(), reader.dims().element_count());

    let block = reader.get_data("CYX", &Selection::new()).unwrap();
    let array = block.as_array::<u8>().unwrap();
    for c in 0..3 {
        for y in 0..4 {
            for x in 0..5 {
                assert_eq!(array[&[c, y, x][..]], raw_value(0, y, x, c));
            }
        }
    }
}

#[test]
fn test_planar_separate_window() {
    let pages = [RawPage::new(5, 4).rgb().planar().strips(2)];

    for capacity in [0, 2] {
        let config = ReaderConfig::default().with_plane_cache_capacity(capacity);
        let mut reader = open(&pages, RawFile::default(), config);

        let selection = Selection::new().c(2).y(1..3).x(2..5);
        let block = reader.get_data("YX", &selection).unwrap();
        assert_eq!(block.shape(), &[2, 3]);

        let array = block.as_array::<u8>().unwrap();
        assert_eq!(array[&[0, 0][..]], raw_value(0, 1, 2, 2));
        assert_eq!(array[&[1, 2][..]], raw_value(0, 2, 4, 2));
    }
}

#[test]
fn test_planar_separate_tiles() {
    let pages = [RawPage::new(40, 24).rgb().planar().tiles(16, 16)];
    let mut reader = open(&pages, RawFile::default(), ReaderConfig::default());

    let block = reader.get_data("CYX", &Selection::new()).unwrap();
    assert_eq!(block.shape(), &[3, 24, 40]);

    let array = block.as_array::<u8>().unwrap();
    for c in 0..3 {
        for (y, x) in [(0, 0), (17, 5), (23, 39), (8, 35)] {
            assert_eq!(array[&[c, y, x][..]], raw_value(0, y, x, c));
        }
    }
}

// =============================================================================
// Directory Structure
// =============================================================================

#[test]
fn test_reduced_resolution_pages_skipped() {
    let pages = [
        RawPage::new(32, 32),
        RawPage::new(16, 16).reduced(),
        RawPage::new(32, 32),
    ];
    let mut reader = open(&pages, RawFile::default(), ReaderConfig::default());

    assert_eq!(reader.scenes().len(), 1);
    assert_eq!(reader.shape(), [1, 1, 2, 32, 32]);
    assert_eq!(reader.metadata().page_count, 2);
    assert_eq!(reader.metadata().skipped_pages, 1);

    // Z=1 is the third directory
    let block = reader.get_data("YX", &Selection::new().z(1)).unwrap();
    assert_eq!(block.as_array::<u8>().unwrap()[&[3, 4][..]], raw_value(2, 3, 4, 0));
}

#[test]
fn test_truncated_walk_warns() {
    init_tracing();
    let pages = [RawPage::new(8, 8), RawPage::new(8, 8)];
    let file = RawFile {
        dangling_next: true,
        ..RawFile::default()
    };
    let mut reader = open(&pages, file, ReaderConfig::default());

    assert_eq!(reader.metadata().page_count, 2);
    assert_eq!(reader.dims().z, 2);
    assert!(reader
        .metadata_warnings()
        .iter()
        .any(|w| w.contains("stopped after 2 page(s)")));

    let block = reader.get_data("YX", &Selection::new().z(1)).unwrap();
    assert_eq!(block.as_array::<u8>().unwrap()[&[7, 7][..]], raw_value(1, 7, 7, 0));
}

#[test]
fn test_bigtiff() {
    let pages = [RawPage::new(12, 10).strips(3), RawPage::new(12, 10).strips(3)];
    let file = RawFile {
        bigtiff: true,
        ..RawFile::default()
    };
    let mut reader = open(&pages, file, ReaderConfig::default());

    assert!(reader.metadata().bigtiff);
    assert_eq!(reader.shape(), [1, 1, 2, 10, 12]);

    let block = reader
        .get_data("ZYX", &Selection::new().y(4..8))
        .unwrap();
    let array = block.as_array::<u8>().unwrap();
    assert_eq!(array[&[0, 0, 0][..]], raw_value(0, 4, 0, 0));
    assert_eq!(array[&[1, 3, 11][..]], raw_value(1, 7, 11, 0));
}

#[test]
fn test_bigtiff_rgb() {
    let pages = [RawPage::new(6, 4).rgb()];
    let file = RawFile {
        bigtiff: true,
        ..RawFile::default()
    };
    let mut reader = open(&pages, file, ReaderConfig::default());

    assert_eq!(reader.shape(), [1, 3, 1, 4, 6]);
    let block = reader.get_data("CYX", &Selection::new()).unwrap();
    let array = block.as_array::<u8>().unwrap();
    assert_eq!(array[&[1, 2, 3][..]], raw_value(0, 2, 3, 1));
}
