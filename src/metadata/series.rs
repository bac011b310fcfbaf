//! Grouping pages into series and locating planes within a series.
//!
//! A series is what the reader exposes as a scene. Grouping rules:
//!
//! ```text
//! ImageJ hyperstack        one series, axes T Z C (sizes > 1) + YX[S]
//!                          pages ordered with C fastest, then Z, then T
//! {"shape": [...]} pages   one series per shape description, covering the
//!                          pages the shape spans: Q...YX[S]
//! anything else            one series per distinct page shape, pages in
//!                          file order wherever they appear
//!                          1 page:  YX[S]     n pages: IYX[S]
//! ```

use serde::Deserialize;
use tracing::debug;

use super::dims::{is_unknown, SAMPLES_DIM_CHAR};
use super::pages::PageInfo;
use crate::format::ImageJMetadata;
use crate::scene::{Dimension, Dimensions};

/// Pages forming one series, with their native axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Positions in the page list, in series order
    pub pages: Vec<usize>,

    /// Native axis letters, one per entry of `shape`
    pub axes: String,

    pub shape: Vec<usize>,
}

impl Series {
    fn plain(pages: Vec<usize>, first: &PageInfo) -> Self {
        let mut axes = String::new();
        let mut shape = Vec::new();
        if pages.len() > 1 {
            axes.push('I');
            shape.push(pages.len());
        }
        push_plane(&mut axes, &mut shape, first);
        Self { pages, axes, shape }
    }
}

fn push_plane(axes: &mut String, shape: &mut Vec<usize>, page: &PageInfo) {
    axes.push_str("YX");
    shape.extend([page.height, page.width]);
    if page.samples > 1 {
        axes.push(SAMPLES_DIM_CHAR);
        shape.push(page.samples);
    }
}

fn plane_shape(page: &PageInfo) -> Vec<usize> {
    let mut shape = vec![page.height, page.width];
    if page.samples > 1 {
        shape.push(page.samples);
    }
    shape
}

/// Group full-resolution pages into series.
pub fn group_pages(pages: &[PageInfo], imagej: Option<&ImageJMetadata>) -> Vec<Series> {
    if let Some(series) = imagej.and_then(|ij| imagej_series(pages, ij)) {
        return vec![series];
    }
    if let Some(series) = shaped_series(pages) {
        return series;
    }
    generic_series(pages)
}

/// One series per distinct page shape, in order of first appearance.
fn generic_series(pages: &[PageInfo]) -> Vec<Series> {
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        match groups.iter_mut().find(|g| pages[g[0]].same_shape(page)) {
            Some(group) => group.push(i),
            None => groups.push(vec![i]),
        }
    }

    groups
        .into_iter()
        .map(|group| {
            let first = group[0];
            Series::plain(group, &pages[first])
        })
        .collect()
}

fn imagej_series(pages: &[PageInfo], imagej: &ImageJMetadata) -> Option<Series> {
    let first = pages.first()?;
    let (frames, slices, channels) = imagej.tzc();
    let planes = frames
        .checked_mul(slices)
        .and_then(|n| n.checked_mul(channels));

    if planes != Some(pages.len()) || !pages.iter().all(|p| first.same_shape(p)) {
        debug!(
            frames,
            slices,
            channels,
            pages = pages.len(),
            "ImageJ counts do not match pages, grouping generically"
        );
        return None;
    }

    let mut axes = String::new();
    let mut shape = Vec::new();
    for (letter, size) in [('T', frames), ('Z', slices), ('C', channels)] {
        if size > 1 {
            axes.push(letter);
            shape.push(size);
        }
    }
    push_plane(&mut axes, &mut shape, first);

    Some(Series {
        pages: (0..pages.len()).collect(),
        axes,
        shape,
    })
}

// =============================================================================
// Shaped
// =============================================================================

/// JSON ImageDescription written by shaped-array TIFF writers.
#[derive(Debug, Deserialize)]
struct ShapeDescription {
    shape: Vec<usize>,
}

/// Array shape from a `{"shape": [...]}` description.
pub fn parse_shape_description(description: &str) -> Option<Vec<usize>> {
    let description = description.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if !description.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ShapeDescription>(description)
        .ok()
        .map(|d| d.shape)
}

/// Series described by shape JSON, one per page carrying a shape.
///
/// Each shape ends with the page plane (`height, width[, samples]`) and its
/// leading dims span that many consecutive pages, which become `Q` axes.
/// Pages outside any shaped series form single-page series. Returns `None`
/// when the first page has no shape or any shape does not fit the pages.
fn shaped_series(pages: &[PageInfo]) -> Option<Vec<Series>> {
    pages
        .first()?
        .tags
        .image_description
        .as_deref()
        .and_then(parse_shape_description)?;

    let mut groups = Vec::new();
    let mut pos = 0;

    while pos < pages.len() {
        let page = &pages[pos];
        let Some(shape) = page
            .tags
            .image_description
            .as_deref()
            .and_then(parse_shape_description)
        else {
            groups.push(Series::plain(vec![pos], page));
            pos += 1;
            continue;
        };

        let plane = plane_shape(page);
        let leading = shape
            .len()
            .checked_sub(plane.len())
            .filter(|&n| shape[n..] == plane[..]);
        let count = leading.and_then(|n| {
            shape[..n]
                .iter()
                .try_fold(1usize, |acc, &size| acc.checked_mul(size))
        });

        let fits = count.filter(|&count| {
            count > 0
                && pos + count <= pages.len()
                && pages[pos..pos + count].iter().all(|p| page.same_shape(p))
        });
        let (Some(leading), Some(count)) = (leading, fits) else {
            debug!(
                page = pos,
                shape = ?shape,
                plane = ?plane,
                "Shape description does not fit the pages, grouping generically"
            );
            return None;
        };

        let mut axes = "Q".repeat(leading);
        axes.push_str("YX");
        if page.samples > 1 {
            axes.push(SAMPLES_DIM_CHAR);
        }
        groups.push(Series {
            pages: (pos..pos + count).collect(),
            axes,
            shape,
        });
        pos += count;
    }

    Some(groups)
}

// =============================================================================
// Layout
// =============================================================================

/// Where each (T, C, Z) plane of a series lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesLayout {
    /// Positions in the page list, in series order
    pub pages: Vec<usize>,

    /// Canonical axes spanned by the page sequence, outermost first
    leading: Vec<(Dimension, usize)>,

    /// Interleaved samples per pixel, folded into C
    pub samples: usize,

    pub dims: Dimensions,

    /// Resolved axis letters, native order
    pub axes: String,
}

impl SeriesLayout {
    /// Map a series onto TCZYX using resolved axis letters.
    ///
    /// `axes` must have one letter per native dim with the page plane
    /// (`YX` plus an optional samples letter) at the end.
    pub fn new(series: &Series, axes: &str) -> Result<Self, String> {
        let letters: Vec<char> = axes.chars().collect();
        if letters.len() != series.shape.len() {
            return Err(format!(
                "axes {axes:?} do not match a shape of {} dims",
                series.shape.len()
            ));
        }

        let has_samples = series.axes.ends_with(SAMPLES_DIM_CHAR);
        let plane_len = if has_samples { 3 } else { 2 };
        let split = letters.len().checked_sub(plane_len).ok_or_else(|| {
            format!("axes {axes:?} have no image plane")
        })?;

        let (height, width) = (series.shape[split], series.shape[split + 1]);
        let samples = if has_samples { series.shape[split + 2] } else { 1 };
        let samples_letter = has_samples.then(|| letters[split + 2]);

        let mut leading = Vec::with_capacity(split);
        for (&letter, &size) in letters[..split].iter().zip(&series.shape[..split]) {
            let dim = match Dimension::from_char(letter) {
                Some(dim) if !dim.is_plane() => dim,
                _ if size == 1 && (is_unknown(letter) || letter == SAMPLES_DIM_CHAR) => continue,
                _ => {
                    return Err(format!(
                        "axis {letter:?} of size {size} has no place in TCZYX"
                    ))
                }
            };
            if leading.iter().any(|(d, _)| *d == dim)
                || (dim == Dimension::Channel && samples_letter == Some('C'))
            {
                return Err(format!("axis {letter:?} appears more than once in {axes:?}"));
            }
            leading.push((dim, size));
        }

        let size_of = |dim: Dimension| {
            leading
                .iter()
                .find(|(d, _)| *d == dim)
                .map_or(1, |(_, size)| *size)
        };
        let dims = Dimensions::new(
            size_of(Dimension::Time),
            size_of(Dimension::Channel) * samples,
            size_of(Dimension::SpatialZ),
            height,
            width,
        );

        let planes: usize = leading.iter().map(|(_, size)| size).product();
        if planes != series.pages.len() {
            return Err(format!(
                "axes {axes:?} describe {planes} planes but the series has {} pages",
                series.pages.len()
            ));
        }

        Ok(Self {
            pages: series.pages.clone(),
            leading,
            samples,
            dims,
            axes: axes.to_string(),
        })
    }

    /// Page-list position and sample index holding plane (t, c, z).
    ///
    /// Indices must be within `dims`.
    pub fn locate(&self, t: usize, c: usize, z: usize) -> (usize, usize) {
        let (c_page, sample) = (c / self.samples, c % self.samples);

        let mut pos = 0;
        for (dim, size) in &self.leading {
            let index = match dim {
                Dimension::Time => t,
                Dimension::Channel => c_page,
                Dimension::SpatialZ => z,
                _ => 0,
            };
            pos = pos * size + index;
        }

        (self.pages[pos], sample)
    }
}
