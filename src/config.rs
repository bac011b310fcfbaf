//! Reader configuration.
//!
//! Every option has a default, so `ReaderConfig::default()` opens any file
//! the way the reader would without configuration. Options can be set with
//! the builder methods or deserialized from JSON:
//!
//! ```
//! use bioimage_tiff::ReaderConfig;
//!
//! let config = ReaderConfig::from_json_str(
//!     r#"{ "dim_order": "CYX", "channel_names": ["DAPI", "GFP"] }"#,
//! ).unwrap();
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Options
//!
//! - `chunk_dims` - Dimensions kept whole in each lazy chunk (default: ZYX)
//! - `dim_order` - Axis letters replacing the guessed ones, for all scenes or per scene
//! - `channel_names` - Channel names replacing the generated ids, for all scenes or per scene
//! - `plane_cache_capacity` - Decoded pages kept per handle (default: 0, disabled)
//! - `max_decode_bytes` - Largest buffer the decoder may allocate (default: 256 MiB)

use serde::Deserialize;

use crate::array::{parse_dimension_order, DEFAULT_PLANE_CACHE_CAPACITY};
use crate::scene::Dimension;

// =============================================================================
// Default Values
// =============================================================================

/// Default chunk dimensions.
pub const DEFAULT_CHUNK_DIMS: &str = "ZYX";

/// Default limit on a single decode buffer (256 MiB).
pub const DEFAULT_MAX_DECODE_BYTES: usize = 256 * 1024 * 1024;

/// Smallest accepted decode buffer limit (1 MiB).
const MIN_DECODE_BYTES: usize = 1024 * 1024;

// =============================================================================
// Overrides
// =============================================================================

/// Explicit axis letters for the file's series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DimOrder {
    /// The same order for every scene
    All(String),

    /// One entry per scene; `None` keeps the guessed order for that scene
    PerScene(Vec<Option<String>>),
}

/// Explicit channel names for the file's series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChannelNames {
    /// The same names for every scene
    All(Vec<String>),

    /// One list per scene
    PerScene(Vec<Vec<String>>),
}

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Dimensions kept whole in each chunk of a lazy block.
    ///
    /// Y and X are always chunk dimensions, even when missing here.
    pub chunk_dims: String,

    /// Axis letters to use instead of guessing.
    pub dim_order: Option<DimOrder>,

    /// Channel names to use instead of generated channel ids.
    pub channel_names: Option<ChannelNames>,

    /// Number of decoded pages to cache per handle; 0 disables caching.
    pub plane_cache_capacity: usize,

    /// Largest buffer the wrapped decoder may allocate for one read.
    pub max_decode_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_dims: DEFAULT_CHUNK_DIMS.to_string(),
            dim_order: None,
            channel_names: None,
            plane_cache_capacity: DEFAULT_PLANE_CACHE_CAPACITY,
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid reader config: {e}"))
    }

    pub fn with_chunk_dims(mut self, chunk_dims: impl Into<String>) -> Self {
        self.chunk_dims = chunk_dims.into();
        self
    }

    pub fn with_dim_order(mut self, dim_order: impl Into<String>) -> Self {
        self.dim_order = Some(DimOrder::All(dim_order.into()));
        self
    }

    pub fn with_scene_dim_orders(mut self, dim_orders: Vec<Option<String>>) -> Self {
        self.dim_order = Some(DimOrder::PerScene(dim_orders));
        self
    }

    pub fn with_channel_names(mut self, names: Vec<String>) -> Self {
        self.channel_names = Some(ChannelNames::All(names));
        self
    }

    pub fn with_scene_channel_names(mut self, names: Vec<Vec<String>>) -> Self {
        self.channel_names = Some(ChannelNames::PerScene(names));
        self
    }

    pub fn with_plane_cache_capacity(mut self, capacity: usize) -> Self {
        self.plane_cache_capacity = capacity;
        self
    }

    pub fn with_max_decode_bytes(mut self, bytes: usize) -> Self {
        self.max_decode_bytes = bytes;
        self
    }

    /// Validate the configuration and return an error message if invalid.
    ///
    /// Checks that need the file (override lengths against scene counts and
    /// dimension sizes) happen when the file is opened.
    pub fn validate(&self) -> Result<(), String> {
        if !self.chunk_dims.is_empty() {
            parse_dimension_order(&self.chunk_dims)
                .map_err(|e| format!("chunk_dims: {e}"))?;
        }

        match &self.dim_order {
            Some(DimOrder::All(order)) if order.is_empty() => {
                return Err("dim_order must not be empty".to_string());
            }
            Some(DimOrder::PerScene(orders)) if orders.is_empty() => {
                return Err("dim_order must list at least one scene".to_string());
            }
            Some(DimOrder::PerScene(orders)) => {
                if let Some(i) = orders.iter().position(|o| o.as_deref() == Some("")) {
                    return Err(format!("dim_order for scene {i} must not be empty"));
                }
            }
            _ => {}
        }

        match &self.channel_names {
            Some(ChannelNames::All(names)) if names.is_empty() => {
                return Err("channel_names must not be empty".to_string());
            }
            Some(ChannelNames::PerScene(lists)) if lists.is_empty() => {
                return Err("channel_names must list at least one scene".to_string());
            }
            _ => {}
        }

        if self.max_decode_bytes < MIN_DECODE_BYTES {
            return Err("max_decode_bytes must be at least 1MB".to_string());
        }

        Ok(())
    }

    /// Chunk dimensions as parsed letters, always including Y and X.
    ///
    /// Call `validate()` first; unparseable letters are ignored here.
    pub fn chunk_dimensions(&self) -> Vec<Dimension> {
        let mut dims: Vec<Dimension> = self
            .chunk_dims
            .chars()
            .filter_map(Dimension::from_char)
            .collect();
        for plane in [Dimension::SpatialY, Dimension::SpatialX] {
            if !dims.contains(&plane) {
                dims.push(plane);
            }
        }
        dims
    }

    /// The configured order for one scene, if any.
    pub fn dim_order_for(&self, scene: usize) -> Option<&str> {
        match self.dim_order.as_ref()? {
            DimOrder::All(order) => Some(order),
            DimOrder::PerScene(orders) => orders.get(scene)?.as_deref(),
        }
    }

    /// The configured channel names for one scene, if any.
    pub fn channel_names_for(&self, scene: usize) -> Option<&[String]> {
        match self.channel_names.as_ref()? {
            ChannelNames::All(names) => Some(names),
            ChannelNames::PerScene(lists) => lists.get(scene).map(Vec::as_slice),
        }
    }

    /// Check per-scene overrides against the number of scenes in a file.
    pub fn check_scene_count(&self, scenes: usize) -> Result<(), String> {
        if let Some(DimOrder::PerScene(orders)) = &self.dim_order {
            if orders.len() != scenes {
                return Err(format!(
                    "dim_order lists {} scene(s) but the file has {scenes}",
                    orders.len()
                ));
            }
        }
        if let Some(ChannelNames::PerScene(lists)) = &self.channel_names {
            if lists.len() != scenes {
                return Err(format!(
                    "channel_names lists {} scene(s) but the file has {scenes}",
                    lists.len()
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
