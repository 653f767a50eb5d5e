use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use gallery_shared::constants::THUMBNAIL_FILE_NAME;
use gallery_shared::thumbnail::write_thumbnail;
use gallery_shared::UploadedFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ServerError;

/// Paths of a freshly written upload and its thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub url: String,
    pub thumbnail_url: String,
}

/// The on-disk asset tree: one directory per image, named by a fresh UUID,
/// holding the original upload and `thumbnail.jpg`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    public_prefix: String,
}

impl AssetStore {
    pub fn new(root: PathBuf, public_prefix: impl Into<String>) -> Result<Self, ServerError> {
        fs::create_dir_all(&root).map_err(|e| {
            ServerError::AssetStorage(format!(
                "Failed to create asset directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        info!(path = %root.display(), "Asset store initialized");

        Ok(Self {
            root,
            public_prefix: public_prefix.into(),
        })
    }

    /// Write an upload into a new directory and derive its thumbnail.
    ///
    /// Nothing is left on disk when either write fails.
    pub fn store_upload(&self, upload: &UploadedFile) -> Result<StoredAsset, ServerError> {
        if upload.bytes.is_empty() {
            return Err(ServerError::BadRequest("Empty upload".to_string()));
        }
        check_filename(&upload.filename)?;

        let dir = self.root.join(Uuid::new_v4().to_string());
        fs::create_dir(&dir).map_err(|e| {
            ServerError::AssetStorage(format!(
                "Failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let original = dir.join(&upload.filename);
        let thumbnail = dir.join(THUMBNAIL_FILE_NAME);

        let written = fs::write(&original, &upload.bytes)
            .map_err(|e| {
                ServerError::AssetStorage(format!(
                    "Failed to write '{}': {}",
                    original.display(),
                    e
                ))
            })
            .and_then(|()| write_thumbnail(&original, &thumbnail).map_err(ServerError::from));

        let (width, height) = match written {
            Ok(dims) => dims,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    warn!(
                        dir = %dir.display(),
                        error = %cleanup,
                        "Failed to remove directory of rejected upload"
                    );
                }
                return Err(e);
            }
        };

        debug!(
            path = %original.display(),
            size = upload.bytes.len(),
            thumb_width = width,
            thumb_height = height,
            "Stored upload"
        );

        Ok(StoredAsset {
            url: original.to_string_lossy().into_owned(),
            thumbnail_url: thumbnail.to_string_lossy().into_owned(),
        })
    }

    /// Remove the directory holding the asset at `url`, thumbnail included.
    pub fn remove_asset_dir(&self, url: &str) -> Result<(), ServerError> {
        let dir = self.asset_dir(Path::new(url))?;

        fs::remove_dir_all(&dir).map_err(|e| {
            ServerError::AssetStorage(format!(
                "Failed to remove directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        debug!(dir = %dir.display(), "Removed asset directory");
        Ok(())
    }

    /// Public URL for a stored path: the root prefix is replaced with the
    /// public endpoint prefix as plain text.
    pub fn public_url(&self, path: &str) -> String {
        path.replace(self.root.to_string_lossy().as_ref(), &self.public_prefix)
    }

    /// Parent directory of an asset path, which must be a direct child of
    /// the root.
    fn asset_dir(&self, asset: &Path) -> Result<PathBuf, ServerError> {
        if asset
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ServerError::BadRequest(
                "Path traversal detected".to_string(),
            ));
        }

        let dir = asset
            .parent()
            .filter(|dir| dir.parent() == Some(self.root.as_path()))
            .ok_or_else(|| {
                ServerError::AssetStorage(format!(
                    "'{}' is not inside the asset root",
                    asset.display()
                ))
            })?;

        Ok(dir.to_path_buf())
    }
}

// The file name becomes a path component, so it must be a single plain name
// and must not shadow the thumbnail.
fn check_filename(filename: &str) -> Result<(), ServerError> {
    let mut components = Path::new(filename).components();
    let plain = match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name == OsStr::new(filename),
        _ => false,
    };
    if !plain || filename.contains('\\') {
        return Err(ServerError::BadRequest("Invalid file name".to_string()));
    }
    if filename == THUMBNAIL_FILE_NAME {
        return Err(ServerError::BadRequest(format!(
            "File name '{THUMBNAIL_FILE_NAME}' is reserved"
        )));
    }
    Ok(())
}
