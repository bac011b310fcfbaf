//! Pixel sample types.
//!
//! The set of types mirrors the buffers the `tiff` decoder produces, so a
//! decoded page never needs converting.

use std::fmt;

use ndarray::ArrayD;
use serde::Serialize;
use tiff::decoder::DecodingResult;

use super::block::PixelData;

/// TIFF SampleFormat codes.
const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_IEEEFP: u16 = 3;
const SAMPLE_FORMAT_VOID: u16 = 4;

/// Sample type of decoded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl PixelType {
    /// Pick the type the decoder will produce for a SampleFormat code and
    /// bit depth. Returns `None` for combinations it cannot decode.
    ///
    /// Only whole-byte depths are accepted. The decoder either rejects
    /// packed depths such as 1, 4 or 12 bits or hands them back still
    /// packed, so pages using them are refused when the file is opened.
    pub fn from_sample_format(format: u16, bits: u16) -> Option<Self> {
        match format {
            SAMPLE_FORMAT_UINT | SAMPLE_FORMAT_VOID => match bits {
                8 => Some(PixelType::U8),
                16 => Some(PixelType::U16),
                32 => Some(PixelType::U32),
                64 => Some(PixelType::U64),
                _ => None,
            },
            SAMPLE_FORMAT_INT => match bits {
                8 => Some(PixelType::I8),
                16 => Some(PixelType::I16),
                32 => Some(PixelType::I32),
                64 => Some(PixelType::I64),
                _ => None,
            },
            SAMPLE_FORMAT_IEEEFP => match bits {
                32 => Some(PixelType::F32),
                64 => Some(PixelType::F64),
                _ => None,
            },
            _ => None,
        }
    }

    /// Size of one sample in bytes.
    pub const fn size_bytes(&self) -> usize {
        match self {
            PixelType::U8 | PixelType::I8 => 1,
            PixelType::U16 | PixelType::I16 => 2,
            PixelType::U32 | PixelType::I32 | PixelType::F32 => 4,
            PixelType::U64 | PixelType::I64 | PixelType::F64 => 8,
        }
    }

    /// NumPy-style name, e.g. `uint16`.
    pub const fn name(&self) -> &'static str {
        match self {
            PixelType::U8 => "uint8",
            PixelType::U16 => "uint16",
            PixelType::U32 => "uint32",
            PixelType::U64 => "uint64",
            PixelType::I8 => "int8",
            PixelType::I16 => "int16",
            PixelType::I32 => "int32",
            PixelType::I64 => "int64",
            PixelType::F32 => "float32",
            PixelType::F64 => "float64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust scalar type that pixels can be decoded into.
pub trait Sample: Copy + Default + Send + Sync + 'static {
    const PIXEL_TYPE: PixelType;

    /// Take the buffer out of a decoder result if it has this type.
    fn from_decoded(result: DecodingResult) -> Option<Vec<Self>>;

    /// Borrow the array out of pixel data if it has this type.
    fn from_data(data: &PixelData) -> Option<&ArrayD<Self>>;

    /// Take the array out of pixel data, handing the data back on mismatch.
    fn take_data(data: PixelData) -> Result<ArrayD<Self>, PixelData>;

    /// Wrap an array into pixel data.
    fn into_data(array: ArrayD<Self>) -> PixelData;
}

macro_rules! impl_sample {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Sample for $ty {
                const PIXEL_TYPE: PixelType = PixelType::$variant;

                fn from_decoded(result: DecodingResult) -> Option<Vec<Self>> {
                    match result {
                        DecodingResult::$variant(buf) => Some(buf),
                        _ => None,
                    }
                }

                fn from_data(data: &PixelData) -> Option<&ArrayD<Self>> {
                    match data {
                        PixelData::$variant(array) => Some(array),
                        _ => None,
                    }
                }

                fn take_data(data: PixelData) -> Result<ArrayD<Self>, PixelData> {
                    match data {
                        PixelData::$variant(array) => Ok(array),
                        other => Err(other),
                    }
                }

                fn into_data(array: ArrayD<Self>) -> PixelData {
                    PixelData::$variant(array)
                }
            }
        )*
    };
}

impl_sample! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
