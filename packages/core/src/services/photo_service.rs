//! Photo Service
//!
//! Photo metadata management. Deleting a photo clears the reference on the
//! user that owned it.

use crate::db::OrgStore;
use crate::models::{NewPhoto, Photo, PhotoUpdate};
use crate::services::error::{store_error, ServiceError};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct PhotoService {
    store: Arc<dyn OrgStore>,
}

impl PhotoService {
    pub fn new(store: Arc<dyn OrgStore>) -> Self {
        Self { store }
    }

    async fn require_photo(&self, id: i64) -> Result<Photo, ServiceError> {
        self.store
            .find_photo(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::photo_not_found(id))
    }

    /// Register photo metadata; the view counter starts at 0
    #[instrument(skip(self, input), fields(filename = %input.filename))]
    pub async fn create_photo(&self, input: NewPhoto) -> Result<Photo, ServiceError> {
        input.validate()?;
        let photo = self.store.insert_photo(input).await.map_err(store_error)?;
        info!(photo_id = photo.id, "Created photo");
        Ok(photo)
    }

    #[instrument(skip(self))]
    pub async fn get_photo(&self, id: i64) -> Result<Photo, ServiceError> {
        self.require_photo(id).await
    }

    /// First photo stored under `filename`, if any
    #[instrument(skip(self))]
    pub async fn find_by_filename(&self, filename: &str) -> Result<Option<Photo>, ServiceError> {
        self.store
            .find_photo_by_filename(filename)
            .await
            .map_err(store_error)
    }

    #[instrument(skip(self))]
    pub async fn list_photos(&self) -> Result<Vec<Photo>, ServiceError> {
        self.store.list_photos().await.map_err(store_error)
    }

    #[instrument(skip(self, update))]
    pub async fn update_photo(&self, id: i64, update: PhotoUpdate) -> Result<Photo, ServiceError> {
        update.validate()?;
        let mut photo = self.require_photo(id).await?;
        photo.apply_update(update);
        let updated = self.store.update_photo(photo).await.map_err(store_error)?;
        info!("Updated photo");
        Ok(updated)
    }

    /// Record one view
    #[instrument(skip(self))]
    pub async fn increment_views(&self, id: i64) -> Result<Photo, ServiceError> {
        self.store
            .increment_photo_views(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::photo_not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_photo(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_photo(id).await.map_err(store_error)? {
            return Err(ServiceError::photo_not_found(id));
        }
        info!("Deleted photo");
        Ok(())
    }
}
