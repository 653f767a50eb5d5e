//! CRUD operations for [`Image`] records.

use chrono::{DateTime, Utc};
use gallery_shared::Category;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Image;

const IMAGE_COLUMNS: &str =
    "id, title, description, category, url, thumbnail_url, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single image, `None` when no row has this id.
    pub fn find_image(&self, id: i64) -> Result<Option<Image>> {
        let image = self
            .conn()
            .query_row(
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
                params![id],
                row_to_image,
            )
            .optional()?;
        Ok(image)
    }

    /// Fetch a single image, failing with [`StoreError::NotFound`].
    pub fn get_image(&self, id: i64) -> Result<Image> {
        self.conn()
            .query_row(
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
                params![id],
                row_to_image,
            )
            .map_err(StoreError::from_lookup)
    }

    /// All images, ordered by id so repeated scans are stable.
    pub fn list_images(&self) -> Result<Vec<Image>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {IMAGE_COLUMNS} FROM images ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_image)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Images filed under `category`, ordered by id.
    pub fn list_images_in_category(&self, category: Category) -> Result<Vec<Image>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE category = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![category.as_str()], row_to_image)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Insert the image when it has no id yet, otherwise update the row with
    /// that id. Runs in a single transaction and returns the stored record.
    ///
    /// Both timestamps must be set by the caller.
    pub fn upsert_image(&mut self, image: &Image) -> Result<Image> {
        let (Some(created_at), Some(updated_at)) = (image.created_at, image.updated_at) else {
            return Err(StoreError::InvalidRecord(
                "image timestamps must be set before saving".to_string(),
            ));
        };

        let tx = self.conn_mut().transaction()?;

        let id = match image.id {
            None => {
                tx.execute(
                    "INSERT INTO images
                        (title, description, category, url, thumbnail_url, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        image.title,
                        image.description,
                        image.category.as_str(),
                        image.url,
                        image.thumbnail_url,
                        created_at.to_rfc3339(),
                        updated_at.to_rfc3339(),
                    ],
                )?;
                tx.last_insert_rowid()
            }
            Some(id) => {
                let affected = tx.execute(
                    "UPDATE images
                     SET title = ?1, description = ?2, category = ?3, url = ?4,
                         thumbnail_url = ?5, created_at = ?6, updated_at = ?7
                     WHERE id = ?8",
                    params![
                        image.title,
                        image.description,
                        image.category.as_str(),
                        image.url,
                        image.thumbnail_url,
                        created_at.to_rfc3339(),
                        updated_at.to_rfc3339(),
                        id,
                    ],
                )?;
                if affected == 0 {
                    return Err(StoreError::NotFound);
                }
                id
            }
        };

        tx.commit()?;

        Ok(Image {
            id: Some(id),
            ..image.clone()
        })
    }

    // only removes the db record, not the files on disk
    pub fn delete_image(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM images WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<Image> {
    let category_str: String = row.get(3)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    let category: Category = category_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Image {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        category,
        url: row.get(4)?,
        thumbnail_url: row.get(5)?,
        created_at: Some(parse_timestamp(6, &created_str)?),
        updated_at: Some(parse_timestamp(7, &updated_str)?),
    })
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}
