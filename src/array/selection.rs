//! Dimension orders and per-dimension index constraints.

use std::ops::Range;

use crate::error::ReaderError;
use crate::scene::{Dimension, Dimensions};

// =============================================================================
// Dimension Order
// =============================================================================

/// Parse a requested dimension order such as `"ZYX"` or `"TCZYX"`.
///
/// Letters must come from `TCZYX` (either case) and appear at most once.
pub fn parse_dimension_order(order: &str) -> Result<Vec<Dimension>, ReaderError> {
    let invalid = |message: String| ReaderError::InvalidDimensions {
        dims: order.to_string(),
        message,
    };

    if order.is_empty() {
        return Err(invalid("dimension order is empty".to_string()));
    }

    let mut dims = Vec::with_capacity(order.len());
    for c in order.chars() {
        let dim = Dimension::from_char(c)
            .ok_or_else(|| invalid(format!("unknown dimension {c:?}, expected one of TCZYX")))?;
        if dims.contains(&dim) {
            return Err(invalid(format!("dimension {dim} appears more than once")));
        }
        dims.push(dim);
    }
    Ok(dims)
}

// =============================================================================
// Selection
// =============================================================================

/// Constraint on one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DimSelection {
    /// Every index along the dimension
    #[default]
    All,

    /// A single index
    Index(usize),

    /// A half-open range of indices
    Range(Range<usize>),
}

impl From<usize> for DimSelection {
    fn from(index: usize) -> Self {
        DimSelection::Index(index)
    }
}

impl From<Range<usize>> for DimSelection {
    fn from(range: Range<usize>) -> Self {
        DimSelection::Range(range)
    }
}

/// Per-dimension constraints for a data request.
///
/// ```
/// use bioimage_tiff::Selection;
///
/// // Plane at T=0, C=1, Z=0 restricted to the first 64 rows
/// let selection = Selection::new().t(0).c(1).z(0).y(0..64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    dims: [DimSelection; 5],
}

impl Selection {
    /// Select everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dim: Dimension, selection: impl Into<DimSelection>) -> Self {
        self.dims[dim.index()] = selection.into();
        self
    }

    pub fn t(self, selection: impl Into<DimSelection>) -> Self {
        self.with(Dimension::Time, selection)
    }

    pub fn c(self, selection: impl Into<DimSelection>) -> Self {
        self.with(Dimension::Channel, selection)
    }

    pub fn z(self, selection: impl Into<DimSelection>) -> Self {
        self.with(Dimension::SpatialZ, selection)
    }

    pub fn y(self, selection: impl Into<DimSelection>) -> Self {
        self.with(Dimension::SpatialY, selection)
    }

    pub fn x(self, selection: impl Into<DimSelection>) -> Self {
        self.with(Dimension::SpatialX, selection)
    }

    pub fn get(&self, dim: Dimension) -> &DimSelection {
        &self.dims[dim.index()]
    }

    /// Resolve the constraints against a scene's sizes.
    ///
    /// Dimensions missing from `order` collapse to a single index (0 unless
    /// specified). Every index is checked before anything is read.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` when an index or range end exceeds the size
    /// - `ConflictingArguments` for empty ranges, or multi-index ranges on
    ///   dimensions the order drops
    pub fn resolve(
        &self,
        order: &[Dimension],
        sizes: &Dimensions,
    ) -> Result<[Range<usize>; 5], ReaderError> {
        let mut ranges: [Range<usize>; 5] = Default::default();

        for dim in Dimension::ALL {
            let size = sizes.get(dim);
            let kept = order.contains(&dim);

            let range = match self.get(dim) {
                DimSelection::All if kept => 0..size,
                DimSelection::All => 0..1,
                DimSelection::Index(i) => {
                    if *i >= size {
                        return Err(ReaderError::IndexOutOfRange {
                            dim: dim.as_char(),
                            requested: i.to_string(),
                            size,
                        });
                    }
                    *i..*i + 1
                }
                DimSelection::Range(r) => {
                    if r.start >= r.end {
                        return Err(ReaderError::ConflictingArguments(format!(
                            "empty range {}..{} for dimension {dim}",
                            r.start, r.end
                        )));
                    }
                    if r.end > size {
                        return Err(ReaderError::IndexOutOfRange {
                            dim: dim.as_char(),
                            requested: format!("{}..{}", r.start, r.end),
                            size,
                        });
                    }
                    if !kept && r.len() != 1 {
                        return Err(ReaderError::ConflictingArguments(format!(
                            "dimension {dim} is not in the requested order but {} indices were selected",
                            r.len()
                        )));
                    }
                    r.clone()
                }
            };
            ranges[dim.index()] = range;
        }

        Ok(ranges)
    }
}
