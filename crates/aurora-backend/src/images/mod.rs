use thiserror::Error;

pub mod tga;
pub mod txi;

pub use tga::{dump_tga, dump_tga_file, encode_tga};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PixelFormat {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Dxt1,
    Dxt3,
    Dxt5,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl MipMap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }
}

/// Decoded image: a list of layers (cube faces, animation frames), each a
/// list of mip maps from largest to smallest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub format: PixelFormat,
    pub layers: Vec<Vec<MipMap>>,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("no image")]
    NoImage,
    #[error("unsupported image with variable layer width")]
    VariableLayerWidth,
    #[error("unsupported pixel format: {0:?}")]
    UnsupportedPixelFormat(PixelFormat),
    #[error("mip map data too short: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("image of {width}x{height} does not fit a TGA header")]
    TooLarge { width: u32, height: u32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
