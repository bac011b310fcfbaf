//! Array adapter.
//!
//! Requests are described by a dimension order (`"ZYX"`, `"TCZYX"`, ...) and
//! a [`Selection`] of per-dimension indices. They resolve to a [`LazyBlock`]
//! that reads only the pages it covers, and compute into a [`PixelBlock`]
//! whose axes follow the requested order.
//!
//! # Request Flow
//!
//! ```text
//! order + Selection ──resolve──► LazyBlock ──compute──► PixelBlock
//!                                    │                      ▲
//!                                    └──chunks──► LazyBlock ┘ (one at a time)
//!
//! compute: for each (T, C, Z) plane
//!            SeriesLayout::locate ──► page + sample
//!            PlaneCache hit, or decode page window (strips/tiles)
//! ```

mod block;
mod cache;
mod dtype;
mod lazy;
mod plane;
mod selection;

pub use block::{PixelBlock, PixelData};
pub use cache::{PlaneCache, PlaneKey, DEFAULT_PLANE_CACHE_CAPACITY};
pub use dtype::{PixelType, Sample};
pub use lazy::LazyBlock;
pub use selection::{parse_dimension_order, DimSelection, Selection};

pub(crate) use lazy::{read_block, BlockSource};
