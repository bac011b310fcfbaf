//! ImageJ hyperstack descriptions.
//!
//! ImageJ writes its metadata as `key=value` lines into the first page's
//! ImageDescription:
//!
//! ```text
//! ImageJ=1.53t
//! images=24
//! channels=2
//! slices=4
//! frames=3
//! hyperstack=true
//! unit=micron
//! spacing=0.5
//! ```
//!
//! Pages are stored with channels varying fastest, then slices, then frames.

use std::collections::BTreeMap;

use serde::Serialize;

use super::detect::IMAGEJ_MARKER;

/// Parsed ImageJ description.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImageJMetadata {
    /// ImageJ version that wrote the file
    pub version: String,

    /// Total number of planes
    pub images: Option<usize>,

    pub channels: Option<usize>,
    pub slices: Option<usize>,
    pub frames: Option<usize>,
    pub hyperstack: bool,

    /// Length unit of the calibration, as written (e.g. `micron`, `\u00B5m`)
    pub unit: Option<String>,

    /// Z step in `unit`
    pub spacing: Option<f64>,

    /// Frame interval in seconds
    pub finterval: Option<f64>,

    /// Keys this parser does not interpret
    pub extra: BTreeMap<String, String>,
}

impl ImageJMetadata {
    /// Parse an ImageDescription. Returns `None` if it is not an ImageJ one.
    ///
    /// Malformed numeric values are treated as absent.
    pub fn parse(description: &str) -> Option<Self> {
        let description = description.trim_start();
        if !description.starts_with(IMAGEJ_MARKER) {
            return None;
        }

        let mut meta = ImageJMetadata::default();
        for line in description.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_end_matches('\0');
            match key.trim() {
                "ImageJ" => meta.version = value.to_string(),
                "images" => meta.images = value.parse().ok(),
                "channels" => meta.channels = value.parse().ok(),
                "slices" => meta.slices = value.parse().ok(),
                "frames" => meta.frames = value.parse().ok(),
                "hyperstack" => meta.hyperstack = value.eq_ignore_ascii_case("true"),
                "unit" => meta.unit = Some(value.to_string()),
                "spacing" => meta.spacing = value.parse().ok(),
                "finterval" => meta.finterval = value.parse().ok(),
                other => {
                    meta.extra.insert(other.to_string(), value.to_string());
                }
            }
        }

        Some(meta)
    }

    /// Frames, slices and channels, each defaulting to 1.
    pub fn tzc(&self) -> (usize, usize, usize) {
        (
            self.frames.unwrap_or(1).max(1),
            self.slices.unwrap_or(1).max(1),
            self.channels.unwrap_or(1).max(1),
        )
    }
}
