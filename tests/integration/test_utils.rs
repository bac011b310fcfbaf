//! Test utilities for integration tests.
//!
//! Synthetic TIFF files are built in memory with the `tiff` crate's encoder.
//! Pixel values encode their position so tests can check exactly which page
//! and which window a block came from.

use std::io::Cursor;
use std::sync::Once;

use tiff::encoder::{colortype, Rational, TiffEncoder};
use tiff::tags::{ResolutionUnit, Tag};

// =============================================================================
// Logging
// =============================================================================

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Pixel Values
// =============================================================================

/// Value stored at (y, x) of a page.
pub fn pixel_value(page: usize, y: usize, x: usize) -> u16 {
    (page * 1000 + y * 10 + x) as u16
}

fn page_data(page: usize, width: u32, height: u32) -> Vec<u16> {
    let (w, h) = (width as usize, height as usize);
    (0..w * h).map(|i| pixel_value(page, i / w, i % w)).collect()
}

// =============================================================================
// Encoded Pages
// =============================================================================

/// One page of a synthetic 16-bit grayscale TIFF.
#[derive(Debug, Clone)]
pub struct TestPage {
    pub width: u32,
    pub height: u32,
    pub description: Option<String>,

    /// Resolution unit and pixels-per-unit (numerator, denominator) for both axes
    pub resolution: Option<(ResolutionUnit, u32, u32)>,
}

impl TestPage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            description: None,
            resolution: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_resolution(mut self, unit: ResolutionUnit, pixels: u32, units: u32) -> Self {
        self.resolution = Some((unit, pixels, units));
        self
    }
}

/// Encode Gray16 pages; page `i` holds `pixel_value(i, y, x)`.
pub fn create_gray16_tiff(pages: &[TestPage]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        for (i, page) in pages.iter().enumerate() {
            let mut image = encoder
                .new_image::<colortype::Gray16>(page.width, page.height)
                .unwrap();
            if let Some(description) = &page.description {
                let _ = image
                    .encoder()
                    .write_tag(Tag::ImageDescription, description.as_str());
            }
            if let Some((unit, n, d)) = page.resolution {
                image.resolution(unit, Rational { n, d });
            }
            image
                .write_data(&page_data(i, page.width, page.height))
                .unwrap();
        }
    }
    buf.into_inner()
}

/// `count` plain Gray16 pages of the same size.
pub fn create_stack(count: usize, width: u32, height: u32) -> Vec<u8> {
    create_gray16_tiff(&vec![TestPage::new(width, height); count])
}

/// ImageJ hyperstack with `frames * slices * channels` pages, C fastest.
pub fn create_imagej_hyperstack(
    frames: usize,
    slices: usize,
    channels: usize,
    width: u32,
    height: u32,
    extra: &str,
) -> Vec<u8> {
    let images = frames * slices * channels;
    let description = format!(
        "ImageJ=1.53t\nimages={images}\nchannels={channels}\nslices={slices}\nframes={frames}\nhyperstack=true\n{extra}"
    );

    let mut pages = vec![TestPage::new(width, height); images];
    pages[0] = TestPage::new(width, height).with_description(description);
    create_gray16_tiff(&pages)
}

/// Single RGB8 page; sample `s` of pixel (y, x) is `y * 10 + x + s * 100`.
pub fn create_rgb_tiff(width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let data: Vec<u8> = (0..w * h)
        .flat_map(|i| {
            let base = ((i / w) * 10 + i % w) as u8;
            [base, base.wrapping_add(100), base.wrapping_add(200)]
        })
        .collect();

    let mut buf = Cursor::new(Vec::new());
    TiffEncoder::new(&mut buf)
        .unwrap()
        .write_image::<colortype::RGB8>(width, height, &data)
        .unwrap();
    buf.into_inner()
}

/// Single Gray32Float page holding `y + x / 10`.
pub fn create_float_tiff(width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let data: Vec<f32> = (0..w * h)
        .map(|i| (i / w) as f32 + (i % w) as f32 / 10.0)
        .collect();

    let mut buf = Cursor::new(Vec::new());
    TiffEncoder::new(&mut buf)
        .unwrap()
        .write_image::<colortype::Gray32Float>(width, height, &data)
        .unwrap();
    buf.into_inner()
}

/// Write bytes to a temporary file with the given name and return its path.
pub fn write_temp_file(name: &str, data: &[u8]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("bioimage-tiff-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

// =============================================================================
// Hand-Built Directories
// =============================================================================

/// Value of sample `sample` at (y, x) of page `page` in a raw 8-bit file.
pub fn raw_value(page: usize, y: usize, x: usize, sample: usize) -> u8 {
    ((page * 7 + y * 16 + x + sample * 85) % 256) as u8
}

/// How a raw page's pixel data is cut into chunks.
#[derive(Debug, Clone, Copy)]
pub enum RawLayout {
    Strips { rows: u32 },
    Tiles { width: u32, height: u32 },
}

/// One uncompressed 8-bit page written field by field.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub width: u32,
    pub height: u32,
    pub samples: u16,

    /// Declared BitsPerSample; pixel data is always written as bytes
    pub bits: u16,
    pub planar_separate: bool,
    pub layout: RawLayout,
    pub subfile_type: u32,
    pub description: Option<String>,
}

impl RawPage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples: 1,
            bits: 8,
            planar_separate: false,
            layout: RawLayout::Strips { rows: height },
            subfile_type: 0,
            description: None,
        }
    }

    pub fn rgb(mut self) -> Self {
        self.samples = 3;
        self
    }

    pub fn with_bits(mut self, bits: u16) -> Self {
        self.bits = bits;
        self
    }

    pub fn planar(mut self) -> Self {
        self.planar_separate = true;
        self
    }

    pub fn strips(mut self, rows: u32) -> Self {
        self.layout = RawLayout::Strips { rows };
        self
    }

    pub fn tiles(mut self, width: u32, height: u32) -> Self {
        self.layout = RawLayout::Tiles { width, height };
        self
    }

    pub fn reduced(mut self) -> Self {
        self.subfile_type = 1;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Chunk payloads in file order; tiles are padded to full size.
    fn chunks(&self, page: usize) -> Vec<Vec<u8>> {
        let (w, h) = (self.width as usize, self.height as usize);
        let (cw, ch) = match self.layout {
            RawLayout::Strips { rows } => (w, rows as usize),
            RawLayout::Tiles { width, height } => (width as usize, height as usize),
        };
        let tiled = matches!(self.layout, RawLayout::Tiles { .. });
        let samples = self.samples as usize;
        let (planes, per_chunk) = if self.planar_separate {
            (samples, 1)
        } else {
            (1, samples)
        };

        let mut chunks = Vec::new();
        for plane in 0..planes {
            for cy in 0..h.div_ceil(ch) {
                for cx in 0..w.div_ceil(cw) {
                    let rows = if tiled { ch } else { ch.min(h - cy * ch) };
                    let mut data = Vec::with_capacity(rows * cw * per_chunk);
                    for r in 0..rows {
                        for c in 0..cw {
                            for k in 0..per_chunk {
                                let (y, x) = (cy * ch + r, cx * cw + c);
                                let sample = if self.planar_separate { plane } else { k };
                                data.push(if y < h && x < w {
                                    raw_value(page, y, x, sample)
                                } else {
                                    0
                                });
                            }
                        }
                    }
                    chunks.push(data);
                }
            }
        }
        chunks
    }
}

/// Options for [`build_raw_tiff`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFile {
    pub bigtiff: bool,

    /// Point the last directory at an offset past the end of the file
    pub dangling_next: bool,
}

enum FieldValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Ascii(String),
}

impl FieldValue {
    fn type_code(&self) -> u16 {
        match self {
            FieldValue::Ascii(_) => 2,
            FieldValue::Short(_) => 3,
            FieldValue::Long(_) => 4,
        }
    }

    fn count(&self) -> usize {
        match self {
            FieldValue::Ascii(s) => s.len() + 1,
            FieldValue::Short(v) => v.len(),
            FieldValue::Long(v) => v.len(),
        }
    }

    fn bytes(&self) -> Vec<u8> {
        match self {
            FieldValue::Ascii(s) => s.bytes().chain([0]).collect(),
            FieldValue::Short(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            FieldValue::Long(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }
}

fn put_offset(buf: &mut Vec<u8>, at: usize, value: u64, bigtiff: bool) {
    if bigtiff {
        buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
    } else {
        buf[at..at + 4].copy_from_slice(&(value as u32).to_le_bytes());
    }
}

fn pad_to_word(buf: &mut Vec<u8>) {
    if buf.len() % 2 == 1 {
        buf.push(0);
    }
}

/// Write a little-endian TIFF directory by directory, without the encoder.
///
/// Covers layouts the encoder cannot produce: tiles, separate sample
/// planes, reduced-resolution pages, BigTIFF and broken directory chains.
pub fn build_raw_tiff(pages: &[RawPage], file: RawFile) -> Vec<u8> {
    let bigtiff = file.bigtiff;
    let (inline, offset_len) = if bigtiff { (8, 8) } else { (4, 4) };

    let mut buf = b"II".to_vec();
    if bigtiff {
        buf.extend(43u16.to_le_bytes());
        buf.extend(8u16.to_le_bytes());
        buf.extend(0u16.to_le_bytes());
    } else {
        buf.extend(42u16.to_le_bytes());
    }
    let mut next_pointer = buf.len();
    buf.extend(vec![0; offset_len]);

    for (i, page) in pages.iter().enumerate() {
        let mut offsets = Vec::new();
        let mut counts = Vec::new();
        for chunk in page.chunks(i) {
            offsets.push(buf.len() as u32);
            counts.push(chunk.len() as u32);
            buf.extend(chunk);
        }
        pad_to_word(&mut buf);

        let samples = page.samples;
        let mut fields: Vec<(u16, FieldValue)> = vec![
            (254, FieldValue::Long(vec![page.subfile_type])),
            (256, FieldValue::Long(vec![page.width])),
            (257, FieldValue::Long(vec![page.height])),
            (258, FieldValue::Short(vec![page.bits; samples as usize])),
            (259, FieldValue::Short(vec![1])),
            (262, FieldValue::Short(vec![if samples == 3 { 2 } else { 1 }])),
            (277, FieldValue::Short(vec![samples])),
            (284, FieldValue::Short(vec![if page.planar_separate { 2 } else { 1 }])),
        ];
        if let Some(description) = &page.description {
            fields.push((270, FieldValue::Ascii(description.clone())));
        }
        match page.layout {
            RawLayout::Strips { rows } => {
                fields.push((273, FieldValue::Long(offsets)));
                fields.push((278, FieldValue::Long(vec![rows])));
                fields.push((279, FieldValue::Long(counts)));
            }
            RawLayout::Tiles { width, height } => {
                fields.push((322, FieldValue::Long(vec![width])));
                fields.push((323, FieldValue::Long(vec![height])));
                fields.push((324, FieldValue::Long(offsets)));
                fields.push((325, FieldValue::Long(counts)));
            }
        }
        fields.sort_by_key(|(tag, _)| *tag);

        // Values too large for the entry go ahead of the directory
        let mut values = Vec::with_capacity(fields.len());
        for (_, value) in &fields {
            let bytes = value.bytes();
            if bytes.len() > inline {
                let at = buf.len() as u64;
                buf.extend(&bytes);
                pad_to_word(&mut buf);
                values.push(Err(at));
            } else {
                values.push(Ok(bytes));
            }
        }

        let ifd_offset = buf.len() as u64;
        put_offset(&mut buf, next_pointer, ifd_offset, bigtiff);

        if bigtiff {
            buf.extend((fields.len() as u64).to_le_bytes());
        } else {
            buf.extend((fields.len() as u16).to_le_bytes());
        }
        for ((tag, value), stored) in fields.iter().zip(values) {
            buf.extend(tag.to_le_bytes());
            buf.extend(value.type_code().to_le_bytes());
            if bigtiff {
                buf.extend((value.count() as u64).to_le_bytes());
            } else {
                buf.extend((value.count() as u32).to_le_bytes());
            }
            let mut field = match stored {
                Ok(bytes) => bytes,
                Err(at) if bigtiff => at.to_le_bytes().to_vec(),
                Err(at) => (at as u32).to_le_bytes().to_vec(),
            };
            field.resize(inline, 0);
            buf.extend(field);
        }
        next_pointer = buf.len();
        buf.extend(vec![0; offset_len]);
    }

    if file.dangling_next {
        let past_end = buf.len() as u64 + 4096;
        put_offset(&mut buf, next_pointer, past_end, bigtiff);
    }
    buf
}
