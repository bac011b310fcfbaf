//! Format detection for TIFF-family files.
//!
//! Decoding itself is delegated to the `tiff` crate. This module only
//! answers "can this reader open the file?" and recognizes the metadata
//! flavors that change how scenes are laid out.
//!
//! # Format Detection
//!
//! Use [`detect::sniff`] for a cheap verdict from leading bytes and file name,
//! or [`detect::is_supported_image`] to let the decoder confirm it can read
//! the first directory.

pub mod detect;
pub mod imagej;

pub use detect::{
    detect_flavor, has_supported_extension, is_supported_image, is_tiff_header,
    looks_like_ome_path, parse_header, sniff, ByteOrder, TiffFlavor, TiffHeaderInfo,
    SNIFF_BYTES, SUPPORTED_EXTENSIONS,
};
pub use imagej::ImageJMetadata;
