use thiserror::Error;

/// Render parameters rejected before any ray is traced.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("image size must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("samples per pixel must be positive")]
    InvalidSampleCount,

    #[error("invalid scene: {0}")]
    InvalidScene(String),
}

/// Failures of the image sink.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("cannot encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("framebuffer is empty")]
    EmptyImage,
}
