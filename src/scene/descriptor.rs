//! Scene descriptors in canonical TCZYX order.

use std::fmt;

use serde::Serialize;

use crate::array::PixelType;
use crate::error::MetadataError;
use crate::metadata::SceneTags;

// =============================================================================
// Dimension
// =============================================================================

/// One axis of the canonical TCZYX order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dimension {
    Time,
    Channel,
    SpatialZ,
    SpatialY,
    SpatialX,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Time,
        Dimension::Channel,
        Dimension::SpatialZ,
        Dimension::SpatialY,
        Dimension::SpatialX,
    ];

    /// Canonical order as a string.
    pub const ORDER: &'static str = "TCZYX";

    /// Position of this dimension in TCZYX.
    pub const fn index(self) -> usize {
        match self {
            Dimension::Time => 0,
            Dimension::Channel => 1,
            Dimension::SpatialZ => 2,
            Dimension::SpatialY => 3,
            Dimension::SpatialX => 4,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Dimension::Time => 'T',
            Dimension::Channel => 'C',
            Dimension::SpatialZ => 'Z',
            Dimension::SpatialY => 'Y',
            Dimension::SpatialX => 'X',
        }
    }

    /// Parse a dimension letter. Lowercase letters are accepted.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'T' => Some(Dimension::Time),
            'C' => Some(Dimension::Channel),
            'Z' => Some(Dimension::SpatialZ),
            'Y' => Some(Dimension::SpatialY),
            'X' => Some(Dimension::SpatialX),
            _ => None,
        }
    }

    /// Whether this is one of the two plane dimensions.
    pub const fn is_plane(self) -> bool {
        matches!(self, Dimension::SpatialY | Dimension::SpatialX)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// =============================================================================
// Dimensions
// =============================================================================

/// Sizes of a scene along each TCZYX dimension.
///
/// Dimensions absent from the source file have size 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    #[serde(rename = "T")]
    pub t: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "Z")]
    pub z: usize,
    #[serde(rename = "Y")]
    pub y: usize,
    #[serde(rename = "X")]
    pub x: usize,
}

impl Dimensions {
    pub const fn new(t: usize, c: usize, z: usize, y: usize, x: usize) -> Self {
        Self { t, c, z, y, x }
    }

    pub fn from_shape(shape: [usize; 5]) -> Self {
        let [t, c, z, y, x] = shape;
        Self { t, c, z, y, x }
    }

    pub const fn get(&self, dim: Dimension) -> usize {
        match dim {
            Dimension::Time => self.t,
            Dimension::Channel => self.c,
            Dimension::SpatialZ => self.z,
            Dimension::SpatialY => self.y,
            Dimension::SpatialX => self.x,
        }
    }

    /// Sizes in TCZYX order.
    pub const fn shape(&self) -> [usize; 5] {
        [self.t, self.c, self.z, self.y, self.x]
    }

    /// Number of elements in the full 5D array.
    pub fn element_count(&self) -> usize {
        self.shape().iter().product()
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Dimensions [T: {}, C: {}, Z: {}, Y: {}, X: {}]>",
            self.t, self.c, self.z, self.y, self.x
        )
    }
}

// =============================================================================
// Physical Pixel Sizes
// =============================================================================

/// Physical size of one voxel step in microns.
///
/// `None` means the file does not say; no value is ever guessed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PhysicalPixelSizes {
    #[serde(rename = "Z")]
    pub z: Option<f64>,
    #[serde(rename = "Y")]
    pub y: Option<f64>,
    #[serde(rename = "X")]
    pub x: Option<f64>,
}

impl PhysicalPixelSizes {
    pub const UNKNOWN: PhysicalPixelSizes = PhysicalPixelSizes {
        z: None,
        y: None,
        x: None,
    };

    pub fn is_unknown(&self) -> bool {
        self.z.is_none() && self.y.is_none() && self.x.is_none()
    }
}

// =============================================================================
// Scene Descriptor
// =============================================================================

/// Everything known about one scene, built once when the file is opened.
#[derive(Debug, Clone, Serialize)]
pub struct SceneDescriptor {
    /// Position in the file's scene list
    pub index: usize,

    /// OME image id, unique within the file
    pub id: String,

    /// Sizes in TCZYX order
    pub dims: Dimensions,

    /// Sample type of the decoded pixels
    pub pixel_type: PixelType,

    /// Physical sizes in microns, `None` where unknown
    pub physical_pixel_sizes: PhysicalPixelSizes,

    /// One name per channel
    pub channel_names: Vec<String>,

    /// Axis letters of the series as laid out in the file (e.g. `IYX`)
    pub native_axes: String,

    /// Axis letters after unknown axes were resolved (e.g. `ZYX`)
    pub resolved_axes: String,

    /// Known tags of the scene's first page
    pub tags: SceneTags,

    /// Why the physical pixel sizes could not be read, if they could not
    #[serde(skip)]
    pub pixel_size_error: Option<MetadataError>,
}

impl SceneDescriptor {
    pub fn shape(&self) -> [usize; 5] {
        self.dims.shape()
    }
}
