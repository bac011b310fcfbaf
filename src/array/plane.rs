//! Reading windows of single pages through the wrapped decoder.
//!
//! A window is a row range and a column range of one page, returned as an
//! `[rows, cols, samples]` array. Whole interleaved pages use the decoder's
//! full-image read; narrower windows decode only the strips or tiles they
//! intersect. Pages with separate sample planes always go through chunks,
//! one plane at a time. With the plane cache enabled, whole pages are always
//! decoded and cached, and windows are sliced out of the cached copy.

use std::io::{Read, Seek};
use std::ops::Range;
use std::sync::Arc;

use ndarray::{s, Array3, ArrayView3, Ix3};
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use super::cache::{PlaneCache, PlaneKey};
use super::dtype::Sample;
use crate::error::FormatError;
use crate::metadata::{ChunkLayout, PageInfo};

/// Read a window of one page.
pub(crate) fn read_page_window<T: Sample, R: Read + Seek>(
    decoder: &mut Decoder<R>,
    cache: &mut PlaneCache,
    scene: usize,
    page: &PageInfo,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Result<Array3<T>, FormatError> {
    let full = rows == (0..page.height) && cols == (0..page.width);

    if cache.is_enabled() {
        let key = PlaneKey {
            scene,
            ifd: page.ifd_index,
        };
        let data = match cache.get(&key) {
            Some(data) => data,
            None => {
                let array = read_full_page::<T, R>(decoder, page)?;
                let data = Arc::new(T::into_data(array.into_dyn()));
                cache.put(key, Arc::clone(&data));
                data
            }
        };
        let array = T::from_data(&data).ok_or_else(|| mismatch::<T>())?;
        let view = array
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|e| FormatError::Tiff(format!("cached page has wrong shape: {e}")))?;
        return Ok(view.slice(s![rows, cols, ..]).to_owned());
    }

    if full {
        return read_full_page(decoder, page);
    }

    read_intersecting_chunks(decoder, page, rows, cols)
}

/// Decode a whole page as `[height, width, samples]`.
fn read_full_page<T: Sample, R: Read + Seek>(
    decoder: &mut Decoder<R>,
    page: &PageInfo,
) -> Result<Array3<T>, FormatError> {
    let (h, w, samples) = (page.height, page.width, page.samples);

    // The full-image read only returns the first of several sample planes
    if page.planar_separate {
        return read_intersecting_chunks(decoder, page, 0..h, 0..w);
    }

    decoder.seek_to_image(page.ifd_index)?;
    let buf = decoded::<T>(decoder.read_image()?)?;

    debug!(ifd = page.ifd_index, width = w, height = h, "Decoded full page");

    Array3::from_shape_vec((h, w, samples), buf).map_err(shape_error)
}

/// Decode only the strips or tiles that intersect the window.
///
/// Separate sample planes repeat the chunk grid once per sample, so plane
/// `s` starts at chunk `s * chunks_per_plane`.
fn read_intersecting_chunks<T: Sample, R: Read + Seek>(
    decoder: &mut Decoder<R>,
    page: &PageInfo,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Result<Array3<T>, FormatError> {
    decoder.seek_to_image(page.ifd_index)?;

    let samples = page.samples;
    let (chunk_w, chunk_h) = match page.layout {
        ChunkLayout::Strips { rows_per_strip } => (page.width, rows_per_strip),
        ChunkLayout::Tiles { width, height } => (width, height),
    };
    let across = page.width.div_ceil(chunk_w);
    let per_plane = across * page.height.div_ceil(chunk_h);

    let (planes, chunk_samples) = if page.planar_separate {
        (samples, 1)
    } else {
        (1, samples)
    };

    let mut out = Array3::<T>::default((rows.len(), cols.len(), samples));
    let mut chunks_read = 0;

    for plane in 0..planes {
        let sample_range = if page.planar_separate {
            plane..plane + 1
        } else {
            0..samples
        };

        for cy in rows.start / chunk_h..rows.end.div_ceil(chunk_h) {
            for cx in cols.start / chunk_w..cols.end.div_ceil(chunk_w) {
                let index = plane * per_plane + cy * across + cx;
                let chunk_index = u32::try_from(index)
                    .map_err(|_| FormatError::Tiff(format!("chunk index {index} out of range")))?;
                let buf = decoded::<T>(decoder.read_chunk(chunk_index)?)?;
                chunks_read += 1;

                let (y0, x0) = (cy * chunk_h, cx * chunk_w);
                let avail_h = chunk_h.min(page.height - y0);
                let avail_w = chunk_w.min(page.width - x0);

                let (chunk_rows, stride) =
                    chunk_geometry(buf.len(), (avail_h, avail_w), (chunk_h, chunk_w), chunk_samples)
                        .ok_or_else(|| {
                            FormatError::Tiff(format!(
                                "chunk {index} holds {} samples, expected {}",
                                buf.len(),
                                avail_h * avail_w * chunk_samples
                            ))
                        })?;
                let chunk = ArrayView3::from_shape(
                    (chunk_rows, stride, chunk_samples),
                    &buf[..chunk_rows * stride * chunk_samples],
                )
                .map_err(shape_error)?;

                let ys = rows.start.max(y0)..rows.end.min(y0 + avail_h);
                let xs = cols.start.max(x0)..cols.end.min(x0 + avail_w);
                out.slice_mut(s![
                    ys.start - rows.start..ys.end - rows.start,
                    xs.start - cols.start..xs.end - cols.start,
                    sample_range.clone()
                ])
                .assign(&chunk.slice(s![
                    ys.start - y0..ys.end - y0,
                    xs.start - x0..xs.end - x0,
                    ..
                ]));
            }
        }
    }

    debug!(
        ifd = page.ifd_index,
        chunks = chunks_read,
        rows = ?rows,
        cols = ?cols,
        "Decoded page window"
    );
    Ok(out)
}

/// Rows and row stride of a decoded chunk.
///
/// Edge chunks come back cropped to the page, padded to the full chunk
/// size, or cropped along one axis only.
fn chunk_geometry(
    len: usize,
    (avail_h, avail_w): (usize, usize),
    (chunk_h, chunk_w): (usize, usize),
    samples: usize,
) -> Option<(usize, usize)> {
    [
        (avail_h, avail_w),
        (chunk_h, chunk_w),
        (chunk_h, avail_w),
        (avail_h, chunk_w),
    ]
    .into_iter()
    .find(|&(rows, stride)| rows * stride * samples == len)
    .or_else(|| (len > chunk_h * chunk_w * samples).then_some((chunk_h, chunk_w)))
}

fn decoded<T: Sample>(result: DecodingResult) -> Result<Vec<T>, FormatError> {
    T::from_decoded(result).ok_or_else(mismatch::<T>)
}

fn mismatch<T: Sample>() -> FormatError {
    FormatError::Tiff(format!(
        "decoded samples are not of type {}",
        T::PIXEL_TYPE
    ))
}

fn shape_error(err: ndarray::ShapeError) -> FormatError {
    FormatError::Tiff(format!("decoded buffer does not match page geometry: {err}"))
}
