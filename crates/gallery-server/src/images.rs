//! Image records and their files.
//!
//! [`ImageStore`] keeps the database and the asset tree in step: uploads are
//! written (and their thumbnails derived) before the record that references
//! them is committed, and a record is deleted before its directory is removed.
//! A crash between the two steps can leave an unreferenced directory behind,
//! but never a record pointing at missing files.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use gallery_shared::{paginate, Category, Page, PageRequest, UploadedFile};
use gallery_store::{Database, Image};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assets::AssetStore;
use crate::error::ServerError;

/// The single SQLite connection, shared by every component that needs it.
pub type SharedDatabase = Arc<Mutex<Database>>;

pub(crate) fn lock_db(db: &SharedDatabase) -> Result<MutexGuard<'_, Database>, ServerError> {
    db.lock()
        .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))
}

/// An image as shown to clients, with public URLs instead of disk paths.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageView {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Clone)]
pub struct ImageStore {
    db: SharedDatabase,
    assets: AssetStore,
}

impl ImageStore {
    pub fn new(db: SharedDatabase, assets: AssetStore) -> Self {
        Self { db, assets }
    }

    /// `None` when no image has this id.
    pub fn get(&self, id: i64) -> Result<Option<Image>, ServerError> {
        Ok(lock_db(&self.db)?.find_image(id)?)
    }

    pub fn list(&self) -> Result<Vec<Image>, ServerError> {
        Ok(lock_db(&self.db)?.list_images()?)
    }

    /// Persist `image`, first storing `upload` when it carries a file.
    ///
    /// Without a file only the metadata is written and the existing asset
    /// paths are kept. When an existing image gets a new file, its previous
    /// directory is removed after the record is committed.
    pub fn save(&self, mut image: Image, upload: Option<&UploadedFile>) -> Result<Image, ServerError> {
        let mut replaced = None;

        if let Some(upload) = upload.filter(|u| u.has_content()) {
            let asset = self.assets.store_upload(upload)?;
            replaced = image.url.replace(asset.url);
            image.thumbnail_url = Some(asset.thumbnail_url);
        }

        let now = Utc::now();
        image.created_at = image.created_at.or(Some(now));
        image.updated_at = Some(now);

        let saved = lock_db(&self.db)?.upsert_image(&image)?;

        info!(
            id = ?saved.id,
            title = %saved.title,
            category = %saved.category,
            "Saved image"
        );

        if let Some(old) = replaced {
            self.cleanup(&old);
        }

        Ok(saved)
    }

    /// Delete the image and its directory, returning the removed record.
    pub fn delete(&self, id: i64) -> Result<Image, ServerError> {
        let image = {
            let db = lock_db(&self.db)?;
            let image = db.find_image(id)?.ok_or(ServerError::ImageNotFound(id))?;
            db.delete_image(id)?;
            image
        };

        info!(id, "Deleted image");

        if let Some(url) = &image.url {
            self.cleanup(url);
        }

        Ok(image)
    }

    /// One page of images, optionally restricted to a single category.
    pub fn list_page(
        &self,
        page_no: usize,
        page_size: usize,
        category: Option<Category>,
    ) -> Result<Page<ImageView>, ServerError> {
        let request = PageRequest::new(page_no, page_size)?;

        let candidates = match category {
            Some(category) => lock_db(&self.db)?.list_images_in_category(category)?,
            None => self.list()?,
        };

        debug!(
            page_no,
            page_size,
            category = ?category,
            total = candidates.len(),
            "Paginating images"
        );

        Ok(paginate(candidates, request).map(|image| self.view(&image)))
    }

    pub fn view(&self, image: &Image) -> ImageView {
        ImageView {
            id: image.id,
            title: image.title.clone(),
            description: image.description.clone(),
            category: image.category,
            image_url: image.url.as_deref().map(|p| self.assets.public_url(p)),
            thumbnail_url: image
                .thumbnail_url
                .as_deref()
                .map(|p| self.assets.public_url(p)),
        }
    }

    // The record is already gone, so a failure here only leaves an orphan.
    fn cleanup(&self, url: &str) {
        if let Err(e) = self.assets.remove_asset_dir(url) {
            warn!(url, error = %e, "Failed to remove asset directory");
        }
    }
}
