//! Directory walk through the wrapped decoder.
//!
//! Every top-level IFD becomes a [`PageInfo`] holding just enough to group
//! pages into scenes and read them back later: geometry, sample type, chunk
//! layout and a handful of descriptive tags.

use std::io::{Read, Seek};

use serde::Serialize;
use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::array::PixelType;
use crate::error::{FormatError, MetadataError};

/// NewSubfileType bit marking a reduced-resolution copy of another page.
const SUBFILE_REDUCED_RESOLUTION: u32 = 0x1;

/// PlanarConfiguration value for separate sample planes.
const PLANAR_SEPARATE: u16 = 2;

// =============================================================================
// Tags
// =============================================================================

/// Descriptive tags of a page, as far as they are present.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SceneTags {
    pub image_description: Option<String>,
    pub software: Option<String>,
    pub date_time: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub artist: Option<String>,
    pub host_computer: Option<String>,

    /// XResolution as a (numerator, denominator) rational, pixels per unit
    pub x_resolution: Option<(u32, u32)>,

    /// YResolution as a (numerator, denominator) rational, pixels per unit
    pub y_resolution: Option<(u32, u32)>,

    /// ResolutionUnit code (1 none, 2 inch, 3 centimeter)
    pub resolution_unit: Option<u16>,

    pub compression: Option<u16>,
    pub photometric_interpretation: Option<u16>,
}

// =============================================================================
// Page
// =============================================================================

/// How a page's pixel data is split on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChunkLayout {
    Strips { rows_per_strip: usize },
    Tiles { width: usize, height: usize },
}

/// One full-resolution page of the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    /// Position among all top-level directories, for seeking
    pub ifd_index: usize,
    pub width: usize,
    pub height: usize,
    pub samples: usize,
    pub pixel_type: PixelType,
    pub layout: ChunkLayout,

    /// Samples stored as separate planes rather than interleaved
    pub planar_separate: bool,

    pub tags: SceneTags,
}

impl PageInfo {
    /// Whether two pages can be stacked into one series.
    pub fn same_shape(&self, other: &PageInfo) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.samples == other.samples
            && self.pixel_type == other.pixel_type
    }
}

/// Result of walking all directories.
#[derive(Debug, Clone, Default)]
pub struct PageWalk {
    /// Full-resolution pages in file order
    pub pages: Vec<PageInfo>,

    /// Directories skipped as reduced-resolution copies
    pub skipped: usize,

    /// Problems that ended the walk or dropped pages
    pub warnings: Vec<MetadataError>,
}

/// Walk every directory, starting from the one the decoder has loaded.
///
/// The decoder must be freshly created (positioned on the first IFD).
///
/// # Errors
///
/// Fails only if the first directory cannot be described; later failures
/// truncate the walk and are recorded as warnings.
pub fn walk_pages<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<PageWalk, FormatError> {
    let mut walk = PageWalk::default();
    let mut ifd_index = 0;

    loop {
        match read_page(decoder, ifd_index) {
            Ok(Some(page)) => walk.pages.push(page),
            Ok(None) => walk.skipped += 1,
            Err(e) if ifd_index == 0 => return Err(e),
            Err(e) => {
                warn!(ifd = ifd_index, error = %e, "Skipping unreadable page");
                walk.warnings.push(MetadataError::InvalidValue {
                    tag: "IFD",
                    message: format!("page {ifd_index}: {e}"),
                });
            }
        }

        if !decoder.more_images() {
            break;
        }
        if let Err(e) = decoder.next_image() {
            warn!(after = ifd_index, error = %e, "Directory walk stopped early");
            walk.warnings.push(MetadataError::TruncatedWalk {
                pages: ifd_index + 1,
                message: e.to_string(),
            });
            break;
        }
        ifd_index += 1;
    }

    debug!(
        pages = walk.pages.len(),
        skipped = walk.skipped,
        "Directory walk complete"
    );
    Ok(walk)
}

/// Describe the decoder's current directory.
///
/// Returns `None` for reduced-resolution pages.
fn read_page<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    ifd_index: usize,
) -> Result<Option<PageInfo>, FormatError> {
    let subfile = decoder
        .find_tag_unsigned::<u32>(Tag::NewSubfileType)?
        .unwrap_or(0);
    if subfile & SUBFILE_REDUCED_RESOLUTION != 0 {
        debug!(ifd = ifd_index, "Skipping reduced-resolution page");
        return Ok(None);
    }

    let (width, height) = decoder.dimensions()?;
    let samples = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1)
        .max(1);
    let bits = decoder
        .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)?
        .and_then(|v| v.first().copied())
        .unwrap_or(1);
    let format = decoder
        .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)?
        .and_then(|v| v.first().copied())
        .unwrap_or(1);

    let pixel_type =
        PixelType::from_sample_format(format, bits).ok_or_else(|| FormatError::UnsupportedFormat {
            reason: format!("sample format {format} with {bits} bits per sample"),
        })?;

    let layout = match (
        decoder.find_tag_unsigned::<u32>(Tag::TileWidth)?,
        decoder.find_tag_unsigned::<u32>(Tag::TileLength)?,
    ) {
        (Some(tw), Some(th)) if tw > 0 && th > 0 => ChunkLayout::Tiles {
            width: tw as usize,
            height: th as usize,
        },
        _ => {
            let rows = decoder
                .find_tag_unsigned::<u32>(Tag::RowsPerStrip)?
                .unwrap_or(height)
                .clamp(1, height.max(1));
            ChunkLayout::Strips {
                rows_per_strip: rows as usize,
            }
        }
    };

    let planar_separate = samples > 1
        && decoder.find_tag_unsigned::<u16>(Tag::PlanarConfiguration)? == Some(PLANAR_SEPARATE);

    let tags = read_tags(decoder)?;

    Ok(Some(PageInfo {
        ifd_index,
        width: width as usize,
        height: height as usize,
        samples: samples as usize,
        pixel_type,
        layout,
        planar_separate,
        tags,
    }))
}

fn read_tags<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<SceneTags, FormatError> {
    let mut ascii = |tag: Tag| -> Result<Option<String>, FormatError> {
        Ok(decoder.find_tag(tag)?.and_then(value_to_string))
    };

    let image_description = ascii(Tag::ImageDescription)?;
    let software = ascii(Tag::Software)?;
    let date_time = ascii(Tag::DateTime)?;
    let make = ascii(Tag::Make)?;
    let model = ascii(Tag::Model)?;
    let artist = ascii(Tag::Artist)?;
    let host_computer = ascii(Tag::HostComputer)?;

    let x_resolution = decoder.find_tag(Tag::XResolution)?.and_then(value_to_rational);
    let y_resolution = decoder.find_tag(Tag::YResolution)?.and_then(value_to_rational);

    Ok(SceneTags {
        image_description,
        software,
        date_time,
        make,
        model,
        artist,
        host_computer,
        x_resolution,
        y_resolution,
        resolution_unit: decoder.find_tag_unsigned::<u16>(Tag::ResolutionUnit)?,
        compression: decoder.find_tag_unsigned::<u16>(Tag::Compression)?,
        photometric_interpretation: decoder
            .find_tag_unsigned::<u16>(Tag::PhotometricInterpretation)?,
    })
}

/// ASCII tag value with trailing NULs removed.
pub(crate) fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Ascii(s) => {
            let s = s.trim_end_matches('\0');
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::List(values) => values.into_iter().find_map(value_to_string),
        _ => None,
    }
}

/// Rational tag value as (numerator, denominator).
pub(crate) fn value_to_rational(value: Value) -> Option<(u32, u32)> {
    match value {
        Value::Rational(n, d) => Some((n, d)),
        Value::Unsigned(n) => Some((n, 1)),
        Value::Short(n) => Some((u32::from(n), 1)),
        Value::List(values) => values.into_iter().next().and_then(value_to_rational),
        _ => None,
    }
}
