//! # gallery-shared
//!
//! Storage-independent building blocks of the gallery: the category
//! enumeration, password hashing, session tokens, pagination and thumbnail
//! derivation.

pub mod constants;
pub mod error;
pub mod pagination;
pub mod password;
pub mod session;
pub mod thumbnail;
pub mod types;

pub use error::GalleryError;
pub use pagination::{paginate, Page, PageRequest};
pub use password::CredentialVerifier;
pub use session::TokenService;
pub use types::{Category, UploadedFile};
