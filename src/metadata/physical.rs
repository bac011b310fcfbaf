//! Physical pixel sizes in microns.
//!
//! X and Y come from the XResolution/YResolution rationals (pixels per
//! unit), Z from the ImageJ `spacing` entry. The unit is the ImageJ `unit`
//! string for ImageJ files and the ResolutionUnit tag otherwise. Nothing is
//! ever guessed: a missing or unrecognized unit leaves the sizes unknown.

use super::pages::SceneTags;
use crate::error::MetadataError;
use crate::format::ImageJMetadata;
use crate::scene::PhysicalPixelSizes;

/// ResolutionUnit codes.
const RESUNIT_NONE: u16 = 1;
const RESUNIT_INCH: u16 = 2;
const RESUNIT_CENTIMETER: u16 = 3;
const RESUNIT_MILLIMETER: u16 = 4;
const RESUNIT_MICROMETER: u16 = 5;

const MICRONS_PER_INCH: f64 = 2.54e4;

/// Microns per unit for a unit name as written by ImageJ and friends.
pub fn unit_name_to_microns(unit: &str) -> Option<f64> {
    let scale = match unit.trim() {
        "pm" | "picometer" => 1e-6,
        "nm" | "nanometer" => 1e-3,
        "micron" | "microns" | "µm" | "\u{03bc}m" | "um" | "\\u00B5m" => 1.0,
        "mm" | "millimeter" => 1e3,
        "cm" | "centimeter" => 1e4,
        "inch" | "cal" => MICRONS_PER_INCH,
        _ => return None,
    };
    Some(scale)
}

/// Microns per unit for a ResolutionUnit code. `Ok(None)` means the file
/// explicitly declares no unit.
pub fn resolution_unit_to_microns(code: u16) -> Result<Option<f64>, MetadataError> {
    match code {
        RESUNIT_NONE => Ok(None),
        RESUNIT_INCH => Ok(Some(MICRONS_PER_INCH)),
        RESUNIT_CENTIMETER => Ok(Some(1e4)),
        RESUNIT_MILLIMETER => Ok(Some(1e3)),
        RESUNIT_MICROMETER => Ok(Some(1.0)),
        other => Err(MetadataError::UnknownUnit(format!("ResolutionUnit {other}"))),
    }
}

/// Physical pixel sizes of a series from its first page's tags.
///
/// # Errors
///
/// - `MissingTag` when the unit or resolution tags are absent
/// - `UnknownUnit` for unit names or codes outside the table
/// - `InvalidValue` for a zero resolution
pub fn physical_pixel_sizes(
    tags: &SceneTags,
    imagej: Option<&ImageJMetadata>,
) -> Result<PhysicalPixelSizes, MetadataError> {
    let scale = match imagej {
        Some(ij) => {
            let unit = ij.unit.as_deref().ok_or(MetadataError::MissingTag("unit"))?;
            unit_name_to_microns(unit)
                .ok_or_else(|| MetadataError::UnknownUnit(unit.to_string()))?
        }
        None => {
            let code = tags
                .resolution_unit
                .ok_or(MetadataError::MissingTag("ResolutionUnit"))?;
            match resolution_unit_to_microns(code)? {
                Some(scale) => scale,
                None => return Ok(PhysicalPixelSizes::UNKNOWN),
            }
        }
    };

    let x = pixel_size(tags.x_resolution, "XResolution", scale)?;
    let y = pixel_size(tags.y_resolution, "YResolution", scale)?;
    let z = imagej
        .and_then(|ij| ij.spacing)
        .filter(|spacing| spacing.is_finite() && *spacing > 0.0)
        .map(|spacing| spacing * scale);

    Ok(PhysicalPixelSizes {
        z,
        y: Some(y),
        x: Some(x),
    })
}

/// Size of one pixel given a pixels-per-unit rational.
fn pixel_size(
    resolution: Option<(u32, u32)>,
    tag: &'static str,
    scale: f64,
) -> Result<f64, MetadataError> {
    let (pixels, units) = resolution.ok_or(MetadataError::MissingTag(tag))?;
    if pixels == 0 || units == 0 {
        return Err(MetadataError::InvalidValue {
            tag,
            message: format!("resolution {pixels}/{units} is not positive"),
        });
    }
    Ok(scale * f64::from(units) / f64::from(pixels))
}
