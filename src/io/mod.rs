mod source;

pub use source::{read_u16_be, read_u16_le, ImageSource, SourceStream};
