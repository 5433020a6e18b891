use thiserror::Error;

/// Failures while resolving an image reference
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Image has zero width or height")]
    ZeroSized,

    #[error("Timed out after {0} ms waiting for image decode")]
    Timeout(u64),

    #[error("Decode task failed: {0}")]
    Join(String),
}

/// Failures while flattening or exporting the canvas
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Layer content unavailable: {0}")]
    Asset(#[from] AssetError),

    #[error("Canvas has zero width or height")]
    EmptyCanvas,

    #[error("Rasterization task failed: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unknown palette entry: {0}")]
    UnknownPaletteEntry(usize),
}

impl From<AssetError> for String {
    fn from(err: AssetError) -> Self {
        err.to_string()
    }
}

impl From<CompositeError> for String {
    fn from(err: CompositeError) -> Self {
        err.to_string()
    }
}

impl From<BoardError> for String {
    fn from(err: BoardError) -> Self {
        err.to_string()
    }
}

impl From<tokio::task::JoinError> for AssetError {
    fn from(err: tokio::task::JoinError) -> Self {
        AssetError::Join(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CompositeError {
    fn from(err: tokio::task::JoinError) -> Self {
        CompositeError::Join(err.to_string())
    }
}
