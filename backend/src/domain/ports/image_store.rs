//! Port abstraction for listing image storage.
//!
//! Two adapters exist: a local uploads directory and an S3 bucket. Which one
//! backs the port is a process-wide decision made from configuration at
//! startup, never per request.

use async_trait::async_trait;

use crate::domain::listing::Locator;

/// Failures raised by image store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Writing the object failed (disk full, network failure, permissions).
    #[error("image write failed: {message}")]
    Write { message: String },
    /// Deleting the object failed.
    #[error("image delete failed: {message}")]
    Delete { message: String },
}

impl StorageError {
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    pub fn delete(message: impl Into<String>) -> Self {
        Self::Delete {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store raw image bytes under a derived unique name; returns the
    /// opaque locator recorded against the listing.
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Result<Locator, StorageError>;

    /// Remove a stored image.
    async fn delete(&self, locator: &Locator) -> Result<(), StorageError>;

    /// Resolve a locator into a client-retrievable URL or path.
    fn public_url(&self, locator: &Locator) -> String;
}
