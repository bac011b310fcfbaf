//! Builds scene descriptors and file metadata from a freshly opened decoder.

use std::io::{Read, Seek};

use serde::Serialize;
use tiff::decoder::Decoder;
use tracing::{debug, warn};

use super::dims::resolve_axes;
use super::pages::{walk_pages, PageInfo};
use super::physical::physical_pixel_sizes;
use super::series::{group_pages, SeriesLayout};
use crate::config::ReaderConfig;
use crate::error::{FormatError, MetadataError, ReaderError};
use crate::format::{detect_flavor, ByteOrder, ImageJMetadata, TiffFlavor, TiffHeaderInfo};
use crate::scene::{generate_ome_channel_id, generate_ome_image_id, SceneDescriptor};

/// File-level metadata, best effort.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub flavor: TiffFlavor,
    pub byte_order: ByteOrder,
    pub bigtiff: bool,

    /// Full-resolution pages
    pub page_count: usize,

    /// Reduced-resolution pages left out of every scene
    pub skipped_pages: usize,

    pub scene_count: usize,

    pub image_description: Option<String>,
    pub software: Option<String>,
    pub date_time: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub artist: Option<String>,
    pub host_computer: Option<String>,

    /// Parsed ImageJ description, for ImageJ files
    pub imagej: Option<ImageJMetadata>,

    /// Problems met while reading metadata, as messages
    pub warnings: Vec<String>,
}

/// Everything derived from the file's directories.
#[derive(Debug, Clone)]
pub struct NormalizedFile {
    pub pages: Vec<PageInfo>,
    pub layouts: Vec<SeriesLayout>,
    pub scenes: Vec<SceneDescriptor>,
    pub metadata: FileMetadata,
}

/// Walk the file and build one descriptor per series.
///
/// # Errors
///
/// - `OpenFailure` when no page can be described
/// - `ConflictingArguments` when configured overrides do not fit the file
pub fn normalize<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    header: TiffHeaderInfo,
    config: &ReaderConfig,
    source_id: &str,
) -> Result<NormalizedFile, ReaderError> {
    let walk = walk_pages(decoder).map_err(|e| ReaderError::open_failure(source_id, e))?;
    let Some(first) = walk.pages.first() else {
        return Err(ReaderError::open_failure(
            source_id,
            FormatError::UnsupportedFormat {
                reason: "no full-resolution pages".to_string(),
            },
        ));
    };

    let description = first.tags.image_description.clone();
    let flavor = detect_flavor(description.as_deref());
    let imagej = match flavor {
        TiffFlavor::ImageJ => description.as_deref().and_then(ImageJMetadata::parse),
        _ => None,
    };

    let series = group_pages(&walk.pages, imagej.as_ref());
    config
        .check_scene_count(series.len())
        .map_err(ReaderError::ConflictingArguments)?;

    let mut warnings: Vec<String> = walk.warnings.iter().map(ToString::to_string).collect();
    let mut layouts = Vec::with_capacity(series.len());
    let mut scenes = Vec::with_capacity(series.len());

    for (index, s) in series.iter().enumerate() {
        let conflict = |message: String| {
            ReaderError::ConflictingArguments(format!("scene {index}: {message}"))
        };

        let axes = resolve_axes(&s.axes, config.dim_order_for(index)).map_err(conflict)?;
        let layout = SeriesLayout::new(s, &axes).map_err(conflict)?;

        let page = &walk.pages[s.pages[0]];
        let id = generate_ome_image_id(index);

        let (physical, pixel_size_error) =
            match physical_pixel_sizes(&page.tags, imagej.as_ref()) {
                Ok(sizes) => (sizes, None),
                Err(e) => {
                    debug!(scene = index, error = %e, "Physical pixel sizes unknown");
                    (Default::default(), Some(e))
                }
            };
        if let Some(e @ MetadataError::UnknownUnit(_)) = &pixel_size_error {
            warn!(scene = index, error = %e, "Could not parse tiff pixel size");
            warnings.push(format!("scene {index}: {e}"));
        }

        let channel_names = match config.channel_names_for(index) {
            Some(names) if names.len() != layout.dims.c => {
                return Err(conflict(format!(
                    "{} channel name(s) given but the scene has {} channel(s)",
                    names.len(),
                    layout.dims.c
                )));
            }
            Some(names) => names.to_vec(),
            None => (0..layout.dims.c)
                .map(|c| generate_ome_channel_id(&id, c))
                .collect(),
        };

        debug!(
            scene = index,
            native = %s.axes,
            resolved = %axes,
            dims = %layout.dims,
            "Normalized scene"
        );

        scenes.push(SceneDescriptor {
            index,
            id,
            dims: layout.dims,
            pixel_type: page.pixel_type,
            physical_pixel_sizes: physical,
            channel_names,
            native_axes: s.axes.clone(),
            resolved_axes: axes,
            tags: page.tags.clone(),
            pixel_size_error,
        });
        layouts.push(layout);
    }

    let tags = &first.tags;
    let metadata = FileMetadata {
        flavor,
        byte_order: header.byte_order,
        bigtiff: header.bigtiff,
        page_count: walk.pages.len(),
        skipped_pages: walk.skipped,
        scene_count: scenes.len(),
        image_description: description,
        software: tags.software.clone(),
        date_time: tags.date_time.clone(),
        make: tags.make.clone(),
        model: tags.model.clone(),
        artist: tags.artist.clone(),
        host_computer: tags.host_computer.clone(),
        imagej,
        warnings,
    };

    Ok(NormalizedFile {
        pages: walk.pages,
        layouts,
        scenes,
        metadata,
    })
}
