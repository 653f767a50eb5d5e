use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Thumbnail error: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("Pagination error: {0}")]
    Page(#[from] PageError),

    #[error("Unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PageError {
    #[error("Page numbers start at 1")]
    ZeroPageNumber,

    #[error("Page size must be positive")]
    ZeroPageSize,
}
