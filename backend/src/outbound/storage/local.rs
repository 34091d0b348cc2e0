//! Filesystem image store serving uploads as static files.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::listing::Locator;
use crate::domain::ports::{ImageStore, StorageError};

use super::object_name;

/// Stores listing images in a local directory.
///
/// Locators are bare object names; [`public_url`](ImageStore::public_url)
/// joins them onto the static mount point the HTTP server exposes.
pub struct LocalImageStore {
    upload_dir: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    /// Create a store rooted at `upload_dir`, served under `public_base`.
    ///
    /// The directory is created on first write, not here, so construction
    /// cannot fail.
    pub fn new(upload_dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            public_base: public_base.into().trim_end_matches('/').to_owned(),
        }
    }

    fn path_for(&self, locator: &Locator) -> PathBuf {
        self.upload_dir.join(locator.as_ref())
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Result<Locator, StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|err| StorageError::write(format!("create upload dir: {err}")))?;

        let name = object_name(filename);
        let path = self.upload_dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| StorageError::write(format!("write {}: {err}", path.display())))?;
        debug!(path = %path.display(), "stored listing image");
        Ok(Locator::new(name))
    }

    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        let path = self.path_for(locator);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::delete(format!(
                "remove {}: {err}",
                path.display()
            ))),
        }
    }

    fn public_url(&self, locator: &Locator) -> String {
        format!("{}/{}", self.public_base, locator.as_ref())
    }
}
