//! Marketplace listing use-cases.
//!
//! Enforces ownership and the type/price invariant, and coordinates the
//! repository with the image store. Image deletion on listing removal is
//! best effort: a stored file the marketplace can no longer reference is an
//! operational concern, not a user-facing failure.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::error::Error;
use super::listing::{
    ImageUpload, Listing, ListingChanges, ListingDraft, ListingId, ListingStatus,
};
use super::ports::{ImageStore, ListingPersistenceError, ListingRepository, StorageError};
use super::search::{Page, SearchCriteria};
use super::user::UserId;

/// Listing service implementing create/read/update/delete and search.
#[derive(Clone)]
pub struct ListingService {
    repository: Arc<dyn ListingRepository>,
    images: Arc<dyn ImageStore>,
}

impl ListingService {
    /// Create a service over the given repository and image store.
    pub fn new(repository: Arc<dyn ListingRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { repository, images }
    }

    /// Create a listing for `owner`, storing the optional image first.
    ///
    /// # Errors
    /// `InvalidRequest` for draft violations or disallowed image types;
    /// `InternalError` when the image store or repository fails. A stored
    /// image is removed best-effort when the subsequent insert fails.
    pub async fn create(
        &self,
        owner: &UserId,
        draft: ListingDraft,
        image: Option<ImageUpload>,
    ) -> Result<Listing, Error> {
        draft
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let locator = match image {
            Some(upload) => {
                if !upload.has_allowed_extension() {
                    return Err(Error::invalid_request(format!(
                        "unsupported image type: {}",
                        upload.filename
                    )));
                }
                Some(
                    self.images
                        .store(upload.bytes, &upload.filename)
                        .await
                        .map_err(map_storage_error)?,
                )
            }
            None => None,
        };

        let listing = Listing {
            id: ListingId::generate(),
            owner: owner.clone(),
            title: draft.title.trim().to_owned(),
            description: draft.description,
            category: draft.category,
            listing_type: draft.listing_type,
            price: draft.price,
            image: locator,
            status: ListingStatus::Active,
            created_at: Utc::now().naive_utc(),
        };

        if let Err(err) = self.repository.insert(&listing).await {
            // The image is already stored; reclaim it so a failed insert does
            // not leave an unreferenced object behind.
            if let Some(locator) = &listing.image {
                if let Err(cleanup) = self.images.delete(locator).await {
                    warn!(
                        locator = locator.as_ref(),
                        error = %cleanup,
                        "failed to reclaim image after insert failure"
                    );
                }
            }
            return Err(map_persistence_error(err));
        }

        Ok(listing)
    }

    /// Fetch a listing by id.
    ///
    /// # Errors
    /// `NotFound` when no such listing exists.
    pub async fn get(&self, id: &ListingId) -> Result<Listing, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("listing {id} not found")))
    }

    /// Apply owner-submitted changes to a listing.
    ///
    /// # Errors
    /// `NotFound` when absent, `Forbidden` when `requesting_user` is not the
    /// owner, `InvalidRequest` when the merged state violates an invariant.
    pub async fn update(
        &self,
        id: &ListingId,
        requesting_user: &UserId,
        changes: ListingChanges,
    ) -> Result<Listing, Error> {
        let current = self.get(id).await?;
        if &current.owner != requesting_user {
            return Err(Error::forbidden("only the owner may modify a listing"));
        }

        let updated = current
            .apply(changes)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        // Last write wins; concurrent owner updates are not coordinated.
        let stored = self
            .repository
            .update(&updated)
            .await
            .map_err(map_persistence_error)?;
        if !stored {
            return Err(Error::not_found(format!("listing {id} not found")));
        }
        Ok(updated)
    }

    /// Delete a listing, releasing its stored image best-effort.
    ///
    /// # Errors
    /// `NotFound` when absent, `Forbidden` when `requesting_user` is not the
    /// owner. Image-deletion failure is logged, never propagated.
    pub async fn delete(&self, id: &ListingId, requesting_user: &UserId) -> Result<(), Error> {
        let current = self.get(id).await?;
        if &current.owner != requesting_user {
            return Err(Error::forbidden("only the owner may delete a listing"));
        }

        let removed = self
            .repository
            .delete(id)
            .await
            .map_err(map_persistence_error)?;
        if !removed {
            return Err(Error::not_found(format!("listing {id} not found")));
        }

        if let Some(locator) = &current.image {
            if let Err(err) = self.images.delete(locator).await {
                warn!(
                    listing = %id,
                    locator = locator.as_ref(),
                    error = %err,
                    "listing deleted but image removal failed"
                );
            }
        }
        Ok(())
    }

    /// Search active listings.
    ///
    /// # Errors
    /// `ServiceUnavailable`/`InternalError` on repository failure.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Page<Listing>, Error> {
        let (items, total) = self
            .repository
            .search(criteria)
            .await
            .map_err(map_persistence_error)?;
        Ok(Page::new(items, total, criteria))
    }

    /// All listings owned by a user, newest first.
    ///
    /// # Errors
    /// `ServiceUnavailable`/`InternalError` on repository failure.
    pub async fn list_owned(&self, owner: &UserId) -> Result<Vec<Listing>, Error> {
        self.repository
            .list_owned(owner)
            .await
            .map_err(map_persistence_error)
    }

    /// Resolve the stored image of a listing into a client-facing URL.
    pub fn image_url(&self, listing: &Listing) -> Option<String> {
        listing
            .image
            .as_ref()
            .map(|locator| self.images.public_url(locator))
    }
}

fn map_persistence_error(error: ListingPersistenceError) -> Error {
    match error {
        ListingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ListingPersistenceError::Query { message }
        | ListingPersistenceError::Corrupt { message } => Error::internal(message),
    }
}

fn map_storage_error(error: StorageError) -> Error {
    // Storage failures carry infrastructure detail; the HTTP layer redacts
    // internal errors before they reach clients.
    Error::internal(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::listing::{Category, ListingType, Locator};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubRepository {
        rows: Mutex<HashMap<String, Listing>>,
        fail_insert: bool,
    }

    #[async_trait]
    impl ListingRepository for StubRepository {
        async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
            if self.fail_insert {
                return Err(ListingPersistenceError::query("insert failed"));
            }
            self.rows
                .lock()
                .expect("lock")
                .insert(listing.id.to_string(), listing.clone());
            Ok(())
        }

        async fn find_by_id(
            &self,
            id: &ListingId,
        ) -> Result<Option<Listing>, ListingPersistenceError> {
            Ok(self.rows.lock().expect("lock").get(&id.to_string()).cloned())
        }

        async fn update(&self, listing: &Listing) -> Result<bool, ListingPersistenceError> {
            let mut rows = self.rows.lock().expect("lock");
            if rows.contains_key(&listing.id.to_string()) {
                rows.insert(listing.id.to_string(), listing.clone());
                Ok(true)
            } else {
                Ok(false)
            }
        }

        async fn delete(&self, id: &ListingId) -> Result<bool, ListingPersistenceError> {
            Ok(self
                .rows
                .lock()
                .expect("lock")
                .remove(&id.to_string())
                .is_some())
        }

        async fn search(
            &self,
            _criteria: &SearchCriteria,
        ) -> Result<(Vec<Listing>, u64), ListingPersistenceError> {
            let rows = self.rows.lock().expect("lock");
            let items: Vec<Listing> = rows.values().cloned().collect();
            let total = items.len() as u64;
            Ok((items, total))
        }

        async fn list_owned(
            &self,
            owner: &UserId,
        ) -> Result<Vec<Listing>, ListingPersistenceError> {
            let rows = self.rows.lock().expect("lock");
            Ok(rows.values().filter(|l| &l.owner == owner).cloned().collect())
        }
    }

    #[derive(Default)]
    struct StubStore {
        stored: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
        fail_store: bool,
        fail_delete: bool,
    }

    #[async_trait]
    impl ImageStore for StubStore {
        async fn store(&self, _bytes: Vec<u8>, filename: &str) -> Result<Locator, StorageError> {
            if self.fail_store {
                return Err(StorageError::write("disk full"));
            }
            let locator = format!("stored/{filename}");
            self.stored.lock().expect("lock").push(locator.clone());
            Ok(Locator::new(locator))
        }

        async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
            self.deleted
                .lock()
                .expect("lock")
                .push(locator.as_ref().to_owned());
            if self.fail_delete {
                return Err(StorageError::delete("permission denied"));
            }
            Ok(())
        }

        fn public_url(&self, locator: &Locator) -> String {
            format!("/static/{}", locator.as_ref())
        }
    }

    fn service() -> (ListingService, Arc<StubRepository>, Arc<StubStore>) {
        let repository = Arc::new(StubRepository::default());
        let store = Arc::new(StubStore::default());
        (
            ListingService::new(repository.clone(), store.clone()),
            repository,
            store,
        )
    }

    fn draft() -> ListingDraft {
        ListingDraft {
            title: "Spade".to_owned(),
            description: "Sturdy garden spade".to_owned(),
            category: Category::Tool,
            listing_type: ListingType::Sell,
            price: Some(500.0),
        }
    }

    fn image() -> ImageUpload {
        ImageUpload {
            filename: "spade.png".to_owned(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn create_returns_active_listing_with_generated_id() {
        let (service, _, _) = service();
        let owner = UserId::generate();
        let listing = service.create(&owner, draft(), None).await.expect("created");
        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.owner, owner);
        assert_eq!(listing.price, Some(500.0));
        let fetched = service.get(&listing.id).await.expect("fetchable");
        assert_eq!(fetched, listing);
    }

    #[tokio::test]
    async fn create_rejects_borrow_with_price() {
        let (service, _, _) = service();
        let mut d = draft();
        d.listing_type = ListingType::Borrow;
        d.price = Some(100.0);
        let err = service
            .create(&UserId::generate(), d, None)
            .await
            .expect_err("invalid draft");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn create_rejects_disallowed_image_extension() {
        let (service, _, store) = service();
        let upload = ImageUpload {
            filename: "malware.exe".to_owned(),
            bytes: vec![0],
        };
        let err = service
            .create(&UserId::generate(), draft(), Some(upload))
            .await
            .expect_err("bad extension");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(store.stored.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn create_reclaims_image_when_insert_fails() {
        let repository = Arc::new(StubRepository {
            fail_insert: true,
            ..StubRepository::default()
        });
        let store = Arc::new(StubStore::default());
        let service = ListingService::new(repository, store.clone());

        let err = service
            .create(&UserId::generate(), draft(), Some(image()))
            .await
            .expect_err("insert fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(
            store.deleted.lock().expect("lock").as_slice(),
            ["stored/spade.png"]
        );
    }

    #[tokio::test]
    async fn update_by_non_owner_is_forbidden() {
        let (service, _, _) = service();
        let owner = UserId::generate();
        let listing = service.create(&owner, draft(), None).await.expect("created");

        let err = service
            .update(
                &listing.id,
                &UserId::generate(),
                ListingChanges {
                    price: Some(Some(1.0)),
                    ..ListingChanges::default()
                },
            )
            .await
            .expect_err("not the owner");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn update_revalidates_merged_state() {
        let (service, _, _) = service();
        let owner = UserId::generate();
        let listing = service.create(&owner, draft(), None).await.expect("created");

        let err = service
            .update(
                &listing.id,
                &owner,
                ListingChanges {
                    listing_type: Some(ListingType::Borrow),
                    ..ListingChanges::default()
                },
            )
            .await
            .expect_err("borrow with retained price");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_forbidden() {
        let (service, _, _) = service();
        let owner = UserId::generate();
        let listing = service.create(&owner, draft(), None).await.expect("created");

        let err = service
            .delete(&listing.id, &UserId::generate())
            .await
            .expect_err("not the owner");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn delete_removes_row_and_requests_image_deletion() {
        let (service, _, store) = service();
        let owner = UserId::generate();
        let listing = service
            .create(&owner, draft(), Some(image()))
            .await
            .expect("created");

        service.delete(&listing.id, &owner).await.expect("deleted");
        let err = service.get(&listing.id).await.expect_err("gone");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(
            store.deleted.lock().expect("lock").as_slice(),
            ["stored/spade.png"]
        );
    }

    #[tokio::test]
    async fn delete_succeeds_even_when_image_deletion_fails() {
        let repository = Arc::new(StubRepository::default());
        let store = Arc::new(StubStore {
            fail_delete: true,
            ..StubStore::default()
        });
        let service = ListingService::new(repository, store);
        let owner = UserId::generate();
        let listing = service
            .create(&owner, draft(), Some(image()))
            .await
            .expect("created");

        service
            .delete(&listing.id, &owner)
            .await
            .expect("image failure must not block deletion");
    }

    #[tokio::test]
    async fn get_unknown_listing_is_not_found() {
        let (service, _, _) = service();
        let err = service
            .get(&ListingId::generate())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn image_url_resolves_through_store() {
        let (service, _, _) = service();
        let owner = UserId::generate();
        let listing = service
            .create(&owner, draft(), Some(image()))
            .await
            .expect("created");
        assert_eq!(
            service.image_url(&listing).as_deref(),
            Some("/static/stored/spade.png")
        );
    }
}
