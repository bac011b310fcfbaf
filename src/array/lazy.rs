//! Deferred reads.
//!
//! A [`LazyBlock`] describes a request (scene, dims, index ranges, sample
//! type) without reading anything. `compute` pulls exactly the pages the
//! request covers; `chunks` splits a large request into smaller ones that
//! can be computed one at a time.

use std::io::{Read, Seek};
use std::ops::Range;

use ndarray::{s, Array5, Axis, IxDyn};
use tiff::decoder::Decoder;

use super::block::{PixelBlock, PixelData};
use super::cache::PlaneCache;
use super::dtype::{PixelType, Sample};
use super::plane::read_page_window;
use crate::error::{FormatError, ReaderError};
use crate::metadata::{PageInfo, SeriesLayout};
use crate::reader::TiffReader;
use crate::scene::Dimension;

/// A not-yet-read block of one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyBlock {
    scene: usize,
    order: Vec<Dimension>,
    ranges: [Range<usize>; 5],
    pixel_type: PixelType,
}

impl LazyBlock {
    /// `ranges` are in TCZYX order; dims missing from `order` must have
    /// single-index ranges.
    pub(crate) fn new(
        scene: usize,
        order: Vec<Dimension>,
        ranges: [Range<usize>; 5],
        pixel_type: PixelType,
    ) -> Self {
        debug_assert!(Dimension::ALL
            .iter()
            .all(|d| order.contains(d) || ranges[d.index()].len() == 1));
        Self {
            scene,
            order,
            ranges,
            pixel_type,
        }
    }

    /// Index of the scene this block reads from.
    pub fn scene(&self) -> usize {
        self.scene
    }

    /// Axis letters of the block, e.g. `"ZYX"`.
    pub fn dims(&self) -> String {
        self.order.iter().map(|d| d.as_char()).collect()
    }

    pub fn order(&self) -> &[Dimension] {
        &self.order
    }

    /// Index range per dimension, in TCZYX order.
    pub fn ranges(&self) -> &[Range<usize>; 5] {
        &self.ranges
    }

    /// Shape of the computed block, one entry per letter of `dims()`.
    pub fn shape(&self) -> Vec<usize> {
        self.order
            .iter()
            .map(|d| self.ranges[d.index()].len())
            .collect()
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn element_count(&self) -> usize {
        self.ranges.iter().map(ExactSizeIterator::len).product()
    }

    /// Bytes the computed block will occupy.
    pub fn size_bytes(&self) -> usize {
        self.element_count() * self.pixel_type.size_bytes()
    }

    /// Read the block.
    pub fn compute(&self, reader: &mut TiffReader) -> Result<PixelBlock, ReaderError> {
        reader.compute(self)
    }

    /// Split the block along every dimension not in `chunk_dims`.
    ///
    /// Y and X are never split. Chunks come out in row-major order of the
    /// split dimensions and together cover the block exactly once.
    pub fn chunks(&self, chunk_dims: &[Dimension]) -> Vec<LazyBlock> {
        let mut chunks = vec![self.ranges.clone()];

        for dim in Dimension::ALL {
            if dim.is_plane() || chunk_dims.contains(&dim) {
                continue;
            }
            let range = self.ranges[dim.index()].clone();
            if range.len() <= 1 {
                continue;
            }
            chunks = chunks
                .into_iter()
                .flat_map(|ranges| {
                    range.clone().map(move |i| {
                        let mut ranges = ranges.clone();
                        ranges[dim.index()] = i..i + 1;
                        ranges
                    })
                })
                .collect();
        }

        chunks
            .into_iter()
            .map(|ranges| LazyBlock {
                scene: self.scene,
                order: self.order.clone(),
                ranges,
                pixel_type: self.pixel_type,
            })
            .collect()
    }
}

// =============================================================================
// Assembly
// =============================================================================

/// Everything needed to read the pages of one scene.
pub(crate) struct BlockSource<'a, R: Read + Seek> {
    pub decoder: &'a mut Decoder<R>,
    pub cache: &'a mut PlaneCache,
    pub pages: &'a [PageInfo],
    pub layout: &'a SeriesLayout,
}

/// Read a block, dispatching on its sample type.
pub(crate) fn read_block<R: Read + Seek>(
    source: BlockSource<'_, R>,
    block: &LazyBlock,
) -> Result<PixelBlock, FormatError> {
    let data = match block.pixel_type {
        PixelType::U8 => assemble::<u8, R>(source, block)?,
        PixelType::U16 => assemble::<u16, R>(source, block)?,
        PixelType::U32 => assemble::<u32, R>(source, block)?,
        PixelType::U64 => assemble::<u64, R>(source, block)?,
        PixelType::I8 => assemble::<i8, R>(source, block)?,
        PixelType::I16 => assemble::<i16, R>(source, block)?,
        PixelType::I32 => assemble::<i32, R>(source, block)?,
        PixelType::I64 => assemble::<i64, R>(source, block)?,
        PixelType::F32 => assemble::<f32, R>(source, block)?,
        PixelType::F64 => assemble::<f64, R>(source, block)?,
    };
    Ok(PixelBlock::new(block.dims(), data))
}

fn assemble<T: Sample, R: Read + Seek>(
    source: BlockSource<'_, R>,
    block: &LazyBlock,
) -> Result<PixelData, FormatError> {
    let [t_range, c_range, z_range, y_range, x_range] = block.ranges.clone();
    let mut out = Array5::<T>::default((
        t_range.len(),
        c_range.len(),
        z_range.len(),
        y_range.len(),
        x_range.len(),
    ));

    // Channels folded from samples share a page; keep the last one read
    let mut last: Option<(usize, ndarray::Array3<T>)> = None;

    for (ti, t) in t_range.enumerate() {
        for (ci, c) in c_range.clone().enumerate() {
            for (zi, z) in z_range.clone().enumerate() {
                let (page_pos, sample) = source.layout.locate(t, c, z);

                let window = match last.take() {
                    Some((pos, window)) if pos == page_pos => window,
                    _ => read_page_window::<T, R>(
                        &mut *source.decoder,
                        &mut *source.cache,
                        block.scene,
                        &source.pages[page_pos],
                        y_range.clone(),
                        x_range.clone(),
                    )?,
                };

                out.slice_mut(s![ti, ci, zi, .., ..])
                    .assign(&window.index_axis(Axis(2), sample));
                last = Some((page_pos, window));
            }
        }
    }

    Ok(T::into_data(reorder(out, &block.order)))
}

/// Drop the TCZYX axes missing from `order` and permute the rest into it.
fn reorder<T: Sample>(array: Array5<T>, order: &[Dimension]) -> ndarray::ArrayD<T> {
    let mut array = array.into_dyn();
    for dim in Dimension::ALL.iter().rev() {
        if !order.contains(dim) {
            array = array.index_axis_move(Axis(dim.index()), 0);
        }
    }

    let kept: Vec<Dimension> = Dimension::ALL
        .into_iter()
        .filter(|d| order.contains(d))
        .collect();
    let permutation: Vec<usize> = order
        .iter()
        .filter_map(|d| kept.iter().position(|k| k == d))
        .collect();

    array
        .permuted_axes(IxDyn(&permutation))
        .as_standard_layout()
        .into_owned()
}
