//! Records persisted in the gallery database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.

use chrono::{DateTime, Utc};
use gallery_shared::Category;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account allowed to manage the gallery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Row id assigned by SQLite.
    pub id: i64,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// Argon2id PHC string. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Fields needed to create a [`User`]; the id comes from the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// Metadata of a gallery image plus the on-disk paths of its files.
///
/// A record that was never saved has no `id` and no timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    /// Path of the original upload inside the asset root.
    pub url: Option<String>,
    /// Path of the derived thumbnail, in the same directory as `url`.
    pub thumbnail_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Image {
    /// A transient record with metadata only.
    pub fn new(title: impl Into<String>, description: Option<String>, category: Category) -> Self {
        Self {
            id: None,
            title: title.into(),
            description,
            category,
            url: None,
            thumbnail_url: None,
            created_at: None,
            updated_at: None,
        }
    }
}
