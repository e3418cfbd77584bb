use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaletteError {
    #[error("image dimensions cannot be zero, got {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error("pixel data cannot be read as RGB(A): {0}")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T, E = PaletteError> = std::result::Result<T, E>;
