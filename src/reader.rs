//! The reader handle and the plugin interface it implements.
//!
//! [`TiffReader`] owns the decoder, the stream under it and everything
//! derived from the file when it was opened. All reads go through `&mut
//! self`; a handle is meant for one consumer at a time.
//!
//! # Example
//!
//! ```no_run
//! use bioimage_tiff::{ImageReader, ReaderConfig, Selection, TiffReader};
//!
//! let mut reader = TiffReader::open("cells.tif", ReaderConfig::default())?;
//! println!("{}", reader.dims());
//!
//! // Plane at T=0, C=1, Z=0
//! let plane = reader.get_data("YX", &Selection::new().t(0).c(1).z(0))?;
//! assert_eq!(plane.dims(), "YX");
//! # Ok::<(), bioimage_tiff::ReaderError>(())
//! ```

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tiff::decoder::{Decoder, Limits};
use tracing::{debug, warn};

use crate::array::{
    parse_dimension_order, read_block, BlockSource, LazyBlock, PixelBlock, PixelType, PlaneCache,
    Selection,
};
use crate::config::ReaderConfig;
use crate::error::{FormatError, ReaderError};
use crate::format::{
    is_supported_image, looks_like_ome_path, parse_header, SNIFF_BYTES, SUPPORTED_EXTENSIONS,
};
use crate::io::{ImageSource, SourceStream};
use crate::metadata::{normalize, FileMetadata, PageInfo, SeriesLayout};
use crate::scene::{
    Dimension, Dimensions, PhysicalPixelSizes, SceneDescriptor, SceneRef, SceneSelector,
};

// =============================================================================
// ImageReader Trait
// =============================================================================

/// Interface a host framework uses to read images, independent of format.
///
/// Implementors provide scene bookkeeping and data access; the per-scene
/// accessors have default implementations on top of
/// [`current_descriptor`](ImageReader::current_descriptor).
pub trait ImageReader {
    /// Ids of every scene in the file, in file order.
    fn scenes(&self) -> &[String];

    /// Descriptors of every scene, in file order.
    fn scene_descriptors(&self) -> &[SceneDescriptor];

    fn current_scene_index(&self) -> usize;

    /// Make another scene current.
    ///
    /// # Errors
    ///
    /// `UnknownScene` if `scene` is not in [`scenes`](ImageReader::scenes);
    /// the current scene is unchanged.
    fn set_scene(&mut self, scene: SceneRef) -> Result<(), ReaderError>;

    /// Describe a read of the current scene without performing it.
    ///
    /// `order` is a permutation of a subset of `TCZYX`. Dimensions left out
    /// of `order` are fixed at their selected index (0 by default).
    fn get_lazy_data(&self, order: &str, selection: &Selection)
        -> Result<LazyBlock, ReaderError>;

    /// Read a block of the current scene.
    fn get_data(&mut self, order: &str, selection: &Selection)
        -> Result<PixelBlock, ReaderError>;

    /// File-level metadata.
    fn metadata(&self) -> &FileMetadata;

    fn current_descriptor(&self) -> &SceneDescriptor {
        &self.scene_descriptors()[self.current_scene_index()]
    }

    /// Id of the current scene.
    fn current_scene(&self) -> &str {
        &self.current_descriptor().id
    }

    fn dims(&self) -> Dimensions {
        self.current_descriptor().dims
    }

    /// Sizes of the current scene in TCZYX order.
    fn shape(&self) -> [usize; 5] {
        self.current_descriptor().shape()
    }

    fn dtype(&self) -> PixelType {
        self.current_descriptor().pixel_type
    }

    /// Physical pixel sizes of the current scene; unknown sizes are `None`.
    fn physical_pixel_sizes(&self) -> PhysicalPixelSizes {
        self.current_descriptor().physical_pixel_sizes
    }

    /// Like [`physical_pixel_sizes`](ImageReader::physical_pixel_sizes) but
    /// reports why the sizes are unknown.
    fn try_physical_pixel_sizes(&self) -> Result<PhysicalPixelSizes, ReaderError> {
        let descriptor = self.current_descriptor();
        match &descriptor.pixel_size_error {
            Some(e) => Err(ReaderError::MetadataUnavailable(e.clone())),
            None => Ok(descriptor.physical_pixel_sizes),
        }
    }

    /// Channel names of the current scene, one per channel.
    fn channel_names(&self) -> &[String] {
        &self.current_descriptor().channel_names
    }
}

// =============================================================================
// ReaderPlugin Trait
// =============================================================================

/// What a host framework needs to discover and construct a reader.
pub trait ReaderPlugin {
    type Reader: ImageReader;

    /// Lowercase file extensions, without the dot.
    fn supported_extensions() -> &'static [&'static str];

    /// Whether the plugin can read the source. Never fails.
    fn is_supported_image(source: &ImageSource) -> bool;

    fn open(source: ImageSource, config: ReaderConfig) -> Result<Self::Reader, ReaderError>;
}

/// Plugin entry point for TIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffPlugin;

impl ReaderPlugin for TiffPlugin {
    type Reader = TiffReader;

    fn supported_extensions() -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    fn is_supported_image(source: &ImageSource) -> bool {
        is_supported_image(source)
    }

    fn open(source: ImageSource, config: ReaderConfig) -> Result<TiffReader, ReaderError> {
        TiffReader::from_source(source, config)
    }
}

// =============================================================================
// TiffReader
// =============================================================================

/// An opened TIFF file.
pub struct TiffReader {
    /// Path or memory identifier, for messages
    source_id: String,

    decoder: Decoder<SourceStream>,
    chunk_dims: Vec<Dimension>,

    pages: Vec<PageInfo>,
    layouts: Vec<SeriesLayout>,
    scenes: Vec<SceneDescriptor>,
    metadata: FileMetadata,

    selector: SceneSelector,
    cache: PlaneCache,
}

impl TiffReader {
    /// Open a file on disk.
    pub fn open(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self, ReaderError> {
        Self::from_source(ImageSource::path(path), config)
    }

    /// Open a TIFF held in memory.
    pub fn from_bytes(
        data: impl Into<bytes::Bytes>,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        Self::from_source(ImageSource::bytes(data), config)
    }

    /// Open any source.
    ///
    /// The configuration is validated before the source is touched. On any
    /// failure the stream is dropped before returning.
    ///
    /// # Errors
    ///
    /// - `ConflictingArguments` for an invalid configuration, or overrides
    ///   that do not fit the file
    /// - `OpenFailure` when the source cannot be read as TIFF
    pub fn from_source(source: ImageSource, config: ReaderConfig) -> Result<Self, ReaderError> {
        config.validate().map_err(ReaderError::ConflictingArguments)?;

        let source_id = source.identifier();
        if source.file_name().is_some_and(looks_like_ome_path) {
            warn!(
                source = %source_id,
                "OME-TIFF metadata is not interpreted by this reader; use an OME-aware reader for full metadata"
            );
        }

        let mut stream = source
            .open()
            .map_err(|e| ReaderError::open_failure(&source_id, e))?;
        let prefix = stream
            .read_prefix(SNIFF_BYTES)
            .map_err(|e| ReaderError::open_failure(&source_id, e))?;
        let header = parse_header(&prefix).ok_or_else(|| {
            ReaderError::open_failure(
                &source_id,
                FormatError::UnsupportedFormat {
                    reason: "missing TIFF header".to_string(),
                },
            )
        })?;

        let mut limits = Limits::default();
        limits.decoding_buffer_size = config.max_decode_bytes;
        limits.intermediate_buffer_size = config.max_decode_bytes;

        let mut decoder = Decoder::new(stream)
            .map_err(|e| ReaderError::open_failure(&source_id, e))?
            .with_limits(limits);

        let normalized = normalize(&mut decoder, header, &config, &source_id)?;

        let ids = normalized.scenes.iter().map(|s| s.id.clone()).collect();
        let mut selector = SceneSelector::new(ids);
        selector.select(&SceneRef::Index(0))?;

        debug!(
            source = %source_id,
            scenes = normalized.scenes.len(),
            pages = normalized.pages.len(),
            flavor = ?normalized.metadata.flavor,
            "Opened TIFF"
        );

        Ok(Self {
            source_id,
            decoder,
            chunk_dims: config.chunk_dimensions(),
            pages: normalized.pages,
            layouts: normalized.layouts,
            scenes: normalized.scenes,
            metadata: normalized.metadata,
            selector,
            cache: PlaneCache::new(config.plane_cache_capacity),
        })
    }

    /// Path or memory identifier of the opened source.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Dimensions kept whole by [`lazy_chunks`](TiffReader::lazy_chunks).
    pub fn chunk_dims(&self) -> &[Dimension] {
        &self.chunk_dims
    }

    /// Describe a read and split it into chunks along every dimension not
    /// in the configured chunk dims.
    pub fn lazy_chunks(
        &self,
        order: &str,
        selection: &Selection,
    ) -> Result<Vec<LazyBlock>, ReaderError> {
        Ok(self.get_lazy_data(order, selection)?.chunks(&self.chunk_dims))
    }

    /// Read a block described by [`get_lazy_data`](ImageReader::get_lazy_data).
    ///
    /// The block may target any scene of this file, not only the current one.
    pub fn compute(&mut self, block: &LazyBlock) -> Result<PixelBlock, ReaderError> {
        let layout = self
            .layouts
            .get(block.scene())
            .ok_or_else(|| ReaderError::UnknownScene {
                requested: SceneRef::Index(block.scene()),
                available: self.layouts.len(),
            })?;

        for dim in Dimension::ALL {
            let range = &block.ranges()[dim.index()];
            let size = layout.dims.get(dim);
            if range.end > size {
                return Err(ReaderError::IndexOutOfRange {
                    dim: dim.as_char(),
                    requested: format!("{}..{}", range.start, range.end),
                    size,
                });
            }
        }

        let source = BlockSource {
            decoder: &mut self.decoder,
            cache: &mut self.cache,
            pages: &self.pages,
            layout,
        };
        Ok(read_block(source, block)?)
    }

    /// The whole current scene in TCZYX order.
    pub fn get_full_data(&mut self) -> Result<PixelBlock, ReaderError> {
        self.get_data(Dimension::ORDER, &Selection::new())
    }

    /// Warnings collected while reading metadata.
    pub fn metadata_warnings(&self) -> &[String] {
        &self.metadata.warnings
    }

    /// File and scene metadata as pretty-printed JSON.
    pub fn metadata_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Export<'a> {
            file: &'a FileMetadata,
            scenes: &'a [SceneDescriptor],
        }

        serde_json::to_string_pretty(&Export {
            file: &self.metadata,
            scenes: &self.scenes,
        })
    }

    /// `(hits, misses)` of the plane cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        self.cache.stats()
    }

    /// Release the file. Dropping the reader does the same.
    pub fn close(mut self) {
        self.cache.clear();
        debug!(source = %self.source_id, "Closed TIFF");
    }
}

impl ImageReader for TiffReader {
    fn scenes(&self) -> &[String] {
        self.selector.ids()
    }

    fn scene_descriptors(&self) -> &[SceneDescriptor] {
        &self.scenes
    }

    fn current_scene_index(&self) -> usize {
        self.selector.current().unwrap_or(0)
    }

    fn set_scene(&mut self, scene: SceneRef) -> Result<(), ReaderError> {
        if self.selector.select(&scene)? {
            self.cache.clear();
            debug!(scene = %scene, "Switched scene");
        }
        Ok(())
    }

    fn get_lazy_data(&self, order: &str, selection: &Selection) -> Result<LazyBlock, ReaderError> {
        let dims = parse_dimension_order(order)?;
        let descriptor = self.current_descriptor();
        let ranges = selection.resolve(&dims, &descriptor.dims)?;
        Ok(LazyBlock::new(descriptor.index, dims, ranges, descriptor.pixel_type))
    }

    fn get_data(&mut self, order: &str, selection: &Selection) -> Result<PixelBlock, ReaderError> {
        let block = self.get_lazy_data(order, selection)?;
        self.compute(&block)
    }

    fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }
}

impl fmt::Debug for TiffReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiffReader")
            .field("source", &self.source_id)
            .field("scenes", &self.scenes.len())
            .field("current_scene", &self.selector.current())
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}
