//! # bioimage-tiff
//!
//! A TIFF reader plugin for bio-image I/O frameworks.
//!
//! This library exposes TIFF-family files (plain TIFF, ImageJ hyperstacks,
//! and OME-TIFF read with generic metadata) through a fixed image-reading
//! interface: every file is a list of scenes, and every scene is a 5D array
//! in canonical Time-Channel-Z-Y-X order. Decoding, compression and
//! tiling are handled by the [`tiff`] crate; this library maps its
//! directories and buffers onto scenes, dimensions and physical sizes.
//!
//! ## Features
//!
//! - **Scene discovery**: Groups pages into series, including ImageJ hyperstacks
//! - **Canonical dims**: Guesses unknown axes or takes them from configuration
//! - **Partial reads**: Decodes only the pages and strips/tiles a request covers
//! - **Lazy blocks**: Describe a read, split it into chunks, compute on demand
//! - **Physical sizes**: Resolution tags and ImageJ units converted to microns
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - Image sources (paths or in-memory bytes)
//! - [`mod@format`] - TIFF sniffing and ImageJ description parsing
//! - [`metadata`] - Page walk, series grouping and metadata normalization
//! - [`scene`] - Scene descriptors and the current-scene state machine
//! - [`array`] - Selections, lazy blocks and pixel blocks
//! - [`reader`] - The `TiffReader` handle and plugin traits
//! - [`config`] - Reader configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use bioimage_tiff::{ImageReader, ReaderConfig, SceneRef, Selection, TiffReader};
//!
//! let config = ReaderConfig::default().with_plane_cache_capacity(16);
//! let mut reader = TiffReader::open("timelapse.tif", config)?;
//!
//! for id in reader.scenes().to_vec() {
//!     reader.set_scene(SceneRef::Id(id))?;
//!     println!("{} {} {}", reader.current_scene(), reader.dims(), reader.dtype());
//! }
//!
//! reader.set_scene(SceneRef::Index(0))?;
//! let stack = reader.get_data("ZYX", &Selection::new().t(0).c(0))?;
//! println!("{:?}", stack.shape());
//! # Ok::<(), bioimage_tiff::ReaderError>(())
//! ```

pub mod array;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod metadata;
pub mod reader;
pub mod scene;

// Re-export commonly used types
pub use array::{
    parse_dimension_order, DimSelection, LazyBlock, PixelBlock, PixelData, PixelType, PlaneCache,
    Sample, Selection, DEFAULT_PLANE_CACHE_CAPACITY,
};
pub use config::{ChannelNames, DimOrder, ReaderConfig, DEFAULT_CHUNK_DIMS, DEFAULT_MAX_DECODE_BYTES};
pub use error::{FormatError, IoError, MetadataError, ReaderError};
pub use format::{
    detect_flavor, has_supported_extension, is_supported_image, is_tiff_header, sniff,
    ImageJMetadata, TiffFlavor, SUPPORTED_EXTENSIONS,
};
pub use io::ImageSource;
pub use metadata::{guess_dim_order, merge_dim_guesses, FileMetadata, SceneTags, UNKNOWN_DIM_CHARS};
pub use reader::{ImageReader, ReaderPlugin, TiffPlugin, TiffReader};
pub use scene::{
    generate_ome_channel_id, generate_ome_image_id, Dimension, Dimensions, PhysicalPixelSizes,
    SceneDescriptor, SceneRef,
};
