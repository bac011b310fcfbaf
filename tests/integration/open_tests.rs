//! Opening, sniffing and closing.
//!
//! Tests verify:
//! - Files open from bytes and from disk
//! - Non-TIFF input and unsupported bit depths fail with OpenFailure
//! - Invalid configuration is rejected before the file is read
//! - The plugin descriptor agrees with the reader

use bioimage_tiff::{
    is_supported_image, sniff, ImageReader, ImageSource, ReaderConfig, ReaderError, ReaderPlugin,
    TiffPlugin, TiffReader,
};

use super::test_utils::{
    build_raw_tiff, create_stack, init_tracing, write_temp_file, RawFile, RawPage,
};

// =============================================================================
// Open
// =============================================================================

#[test]
fn test_open_from_bytes() {
    init_tracing();
    let reader = TiffReader::from_bytes(create_stack(1, 10, 8), ReaderConfig::default()).unwrap();

    assert_eq!(reader.scenes(), &["Image:0".to_string()]);
    assert_eq!(reader.current_scene(), "Image:0");
    assert_eq!(reader.shape(), [1, 1, 1, 8, 10]);
    assert!(reader.source_id().starts_with("memory://"));
}

#[test]
fn test_open_from_path() {
    init_tracing();
    let path = write_temp_file("open_from_path.tif", &create_stack(3, 6, 4));
    let reader = TiffReader::open(&path, ReaderConfig::default()).unwrap();

    assert_eq!(reader.scenes().len(), 1);
    assert_eq!(reader.dims().z, 3);
    reader.close();
}

#[test]
fn test_open_missing_file() {
    let err = TiffReader::open("/nonexistent/missing.tif", ReaderConfig::default()).unwrap_err();
    match err {
        ReaderError::OpenFailure { path, .. } => assert!(path.contains("missing.tif")),
        other => panic!("expected OpenFailure, got {other:?}"),
    }
}

#[test]
fn test_open_not_a_tiff() {
    let err = TiffReader::from_bytes(b"\x89PNG\r\n\x1a\nrest".to_vec(), ReaderConfig::default())
        .unwrap_err();
    assert!(matches!(err, ReaderError::OpenFailure { .. }));
}

#[test]
fn test_open_truncated_tiff() {
    let data = create_stack(1, 10, 10);
    let err = TiffReader::from_bytes(data[..12].to_vec(), ReaderConfig::default()).unwrap_err();
    assert!(matches!(err, ReaderError::OpenFailure { .. }));
}

#[test]
fn test_packed_bit_depth_fails_open() {
    let data = build_raw_tiff(&[RawPage::new(8, 8).with_bits(4)], RawFile::default());
    let err = TiffReader::from_bytes(data, ReaderConfig::default()).unwrap_err();
    assert!(matches!(err, ReaderError::OpenFailure { .. }));
}

#[test]
fn test_invalid_config_rejected_before_reading() {
    // The file does not exist; the config error must win
    let config = ReaderConfig::default().with_chunk_dims("QQ");
    let err = TiffReader::open("/nonexistent/missing.tif", config).unwrap_err();
    assert!(matches!(err, ReaderError::ConflictingArguments(_)));
}

#[test]
fn test_ome_path_still_opens() {
    init_tracing();
    let path = write_temp_file("generic.ome.tif", &create_stack(1, 4, 4));
    let reader = TiffReader::open(&path, ReaderConfig::default()).unwrap();
    assert_eq!(reader.scenes().len(), 1);
}

// =============================================================================
// Sniffing and Plugin
// =============================================================================

#[test]
fn test_sniff_and_supported_image() {
    let data = create_stack(1, 4, 4);
    assert!(sniff(Some(&data), None));
    assert!(!sniff(Some(b"GIF89a"), Some("image.tif")));
    assert!(sniff(None, Some("IMAGE.TIFF")));

    assert!(is_supported_image(&ImageSource::bytes(data)));
    assert!(!is_supported_image(&ImageSource::bytes(b"II*\0garbage".to_vec())));
    assert!(!is_supported_image(&ImageSource::path("/nonexistent/x.tif")));
}

#[test]
fn test_plugin_descriptor() {
    assert_eq!(TiffPlugin::supported_extensions(), &["tif", "tiff"]);

    let source = ImageSource::bytes(create_stack(2, 4, 4));
    assert!(TiffPlugin::is_supported_image(&source));

    let reader = TiffPlugin::open(source, ReaderConfig::default()).unwrap();
    assert_eq!(reader.dims().z, 2);
}
