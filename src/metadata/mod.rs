//! Metadata normalization.
//!
//! Turns the wrapped decoder's view of a file (a flat list of directories
//! and their tags) into scenes in canonical TCZYX order:
//!
//! ```text
//! IFD walk ──► PageInfo list ──► Series (native axes) ──► SeriesLayout (TCZYX)
//!                  │                                           │
//!                  └── tags ──► physical pixel sizes ──────────┴──► SceneDescriptor
//! ```

pub mod dims;
pub mod normalize;
pub mod pages;
pub mod physical;
pub mod series;

pub use dims::{guess_dim_order, merge_dim_guesses, UNKNOWN_DIM_CHARS};
pub use normalize::{normalize, FileMetadata, NormalizedFile};
pub use pages::{walk_pages, ChunkLayout, PageInfo, PageWalk, SceneTags};
pub use physical::physical_pixel_sizes;
pub use series::{group_pages, Series, SeriesLayout};
