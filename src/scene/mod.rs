//! Scene abstraction layer.
//!
//! A scene is one independently addressable image series inside a TIFF
//! file. Every scene is described in the canonical TCZYX axis order
//! regardless of how its pages are laid out on disk:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               TiffReader                │
//! │   (owns the decoder and the selector)   │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │  SceneSelector  │    │  SceneDescriptor[]  │
//! │ (current scene) │    │ (shape, sizes, ids) │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod descriptor;
mod ids;
mod selector;

pub use descriptor::{Dimension, Dimensions, PhysicalPixelSizes, SceneDescriptor};
pub use ids::{generate_ome_channel_id, generate_ome_image_id};
pub use selector::{SceneRef, SceneSelector};
