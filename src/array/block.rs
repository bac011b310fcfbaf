//! Decoded pixel blocks.

use ndarray::ArrayD;

use super::dtype::{PixelType, Sample};

/// Decoded samples of one type, as an n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Run an expression on the inner array whatever its element type.
macro_rules! with_array {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            PixelData::U8($array) => $body,
            PixelData::U16($array) => $body,
            PixelData::U32($array) => $body,
            PixelData::U64($array) => $body,
            PixelData::I8($array) => $body,
            PixelData::I16($array) => $body,
            PixelData::I32($array) => $body,
            PixelData::I64($array) => $body,
            PixelData::F32($array) => $body,
            PixelData::F64($array) => $body,
        }
    };
}

impl PixelData {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            PixelData::U8(_) => PixelType::U8,
            PixelData::U16(_) => PixelType::U16,
            PixelData::U32(_) => PixelType::U32,
            PixelData::U64(_) => PixelType::U64,
            PixelData::I8(_) => PixelType::I8,
            PixelData::I16(_) => PixelType::I16,
            PixelData::I32(_) => PixelType::I32,
            PixelData::I64(_) => PixelType::I64,
            PixelData::F32(_) => PixelType::F32,
            PixelData::F64(_) => PixelType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes occupied by the samples.
    pub fn size_bytes(&self) -> usize {
        self.len() * self.pixel_type().size_bytes()
    }

    /// Every sample widened to `f64`, in logical (row-major) order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_array!(self, a => a.iter().map(|v| *v as f64).collect())
    }
}

/// The decoded array for a requested sub-range of a scene.
///
/// `dims` names the axes of `data` in order, e.g. `"YX"` or `"TCZYX"`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    dims: String,
    data: PixelData,
}

impl PixelBlock {
    pub(crate) fn new(dims: String, data: PixelData) -> Self {
        debug_assert_eq!(dims.len(), data.shape().len());
        Self { dims, data }
    }

    /// Axis letters of the block, one per array dimension.
    pub fn dims(&self) -> &str {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn pixel_type(&self) -> PixelType {
        self.data.pixel_type()
    }

    /// Number of samples in the block.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn into_data(self) -> PixelData {
        self.data
    }

    /// Borrow the array if its element type is `T`.
    pub fn as_array<T: Sample>(&self) -> Option<&ArrayD<T>> {
        T::from_data(&self.data)
    }

    /// Take the array if its element type is `T`.
    pub fn into_array<T: Sample>(self) -> Result<ArrayD<T>, Self> {
        let dims = self.dims;
        T::take_data(self.data).map_err(|data| PixelBlock { dims, data })
    }
}
