use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A record or triplet would not fit its 2-byte length field.
    #[error("{what} too large: {size} bytes exceeds maximum of {max}")]
    EncodingOverflow {
        what: &'static str,
        size: usize,
        max: usize,
    },
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("unsupported bits per pixel: {0} (must be 1, 4 or 8)")]
    UnsupportedBitDepth(u8),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("font resolution failed: {0}")]
    FontResolution(String),
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),
    #[error("transform stack underflow: cannot pop the page frame")]
    TransformUnderflow,
    #[error("page is {actual:?}, expected {expected:?}")]
    InvalidPageState {
        expected: crate::afp::PageState,
        actual: crate::afp::PageState,
    },
    #[error("page {sequence} was started by a different renderer")]
    ForeignPage { sequence: usize },
    #[error("image decoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
