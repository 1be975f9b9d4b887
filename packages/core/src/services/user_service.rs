//! User Service
//!
//! CRUD for employees. References to positions and photos are checked
//! before every write; uniqueness of email, phone and photo is enforced by
//! the schema and reported as `DuplicateUser`.

use crate::db::OrgStore;
use crate::models::{NewUser, User, UserPage, UserQuery, UserUpdate};
use crate::services::error::{store_error, ServiceError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn OrgStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn OrgStore>) -> Self {
        Self { store }
    }

    async fn require_user(&self, id: &str) -> Result<User, ServiceError> {
        self.store
            .find_user(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::user_not_found(id))
    }

    async fn check_references(
        &self,
        position_id: Option<&str>,
        photo_id: Option<i64>,
    ) -> Result<(), ServiceError> {
        if let Some(position_id) = position_id {
            let position = self
                .store
                .find_position(position_id)
                .await
                .map_err(store_error)?;
            if position.is_none() {
                warn!(position_id, "Rejected user write: position does not exist");
                return Err(ServiceError::position_not_found(position_id));
            }
        }

        if let Some(photo_id) = photo_id {
            let photo = self.store.find_photo(photo_id).await.map_err(store_error)?;
            if photo.is_none() {
                warn!(photo_id, "Rejected user write: photo does not exist");
                return Err(ServiceError::photo_not_found(photo_id));
            }
        }

        Ok(())
    }

    /// Create a user
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a blank name or malformed email/phone
    /// - `PositionNotFound` / `PhotoNotFound` for dangling references
    /// - `DuplicateUser` if email, phone or photo is already taken
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUser) -> Result<User, ServiceError> {
        input.validate()?;
        self.check_references(input.position_id.as_deref(), input.photo_id)
            .await?;

        let user = self.store.insert_user(input).await.map_err(store_error)?;
        info!(user_id = %user.id, position_id = ?user.position_id, "Created user");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        self.require_user(id).await
    }

    /// Apply a partial update; an empty update returns the user unchanged
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, ServiceError> {
        let mut user = self.require_user(id).await?;

        if update.is_empty() {
            debug!("Empty update; returning user unchanged");
            return Ok(user);
        }

        update.validate()?;
        let new_position = update.position_id.as_ref().and_then(|p| p.as_deref());
        let new_photo = update.photo_id.flatten();
        self.check_references(new_position, new_photo).await?;

        user.apply_update(update);
        let updated = self.store.update_user(user).await.map_err(store_error)?;
        info!("Updated user");
        Ok(updated)
    }

    /// Delete a user; the user's photo is kept
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        if !self.store.delete_user(id).await.map_err(store_error)? {
            return Err(ServiceError::user_not_found(id));
        }
        info!("Deleted user");
        Ok(())
    }

    /// One page of users ordered by name, filtered by a name substring
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: UserQuery) -> Result<UserPage, ServiceError> {
        query.validate()?;

        let (results, total) = self.store.list_users(&query).await.map_err(store_error)?;
        debug!(total, returned = results.len(), "Listed users");
        Ok(UserPage::new(&query, total, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, LibsqlStore};
    use crate::models::{Gender, NewPhoto, NewPosition, ValidationError};
    use crate::services::ErrorKind;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn create_test_service() -> (UserService, Arc<dyn OrgStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let store: Arc<dyn OrgStore> = Arc::new(LibsqlStore::new(Arc::new(db)));
        (UserService::new(store.clone()), store, temp_dir)
    }

    fn new_user(name: &str, n: u32) -> NewUser {
        NewUser {
            full_name: name.to_string(),
            email: format!("user{}@example.com", n),
            phone: format!("+2519000000{:02}", n),
            birth_date: NaiveDate::from_ymd_opt(1992, 8, 12).unwrap(),
            hire_date: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            gender: Gender::Female,
            position_id: None,
            photo_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_with_references() {
        let (service, store, _temp) = create_test_service().await;
        let position = store
            .insert_position(NewPosition::new("Engineer", "Builds things"))
            .await
            .unwrap();
        let photo = store
            .insert_photo(NewPhoto::new("Badge", "Badge photo", "badge.jpg"))
            .await
            .unwrap();

        let mut input = new_user("Hana Tesfaye", 1);
        input.position_id = Some(position.id.clone());
        input.photo_id = Some(photo.id);
        let user = service.create_user(input).await.unwrap();

        assert_eq!(user.position_id, Some(position.id));
        assert_eq!(user.photo_id, Some(photo.id));
        assert_eq!(service.get_user(&user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_create_user_rejects_unknown_position() {
        let (service, store, _temp) = create_test_service().await;

        let mut input = new_user("Hana Tesfaye", 1);
        input.position_id = Some("missing".to_string());
        let err = service.create_user(input).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        let (users, total) = store.list_users(&UserQuery::default()).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_email() {
        let (service, _store, _temp) = create_test_service().await;

        let mut input = new_user("Hana Tesfaye", 1);
        input.email = "not-an-email".to_string();
        let err = service.create_user(input).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::ValidationFailed(ValidationError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_phone_is_conflict() {
        let (service, _store, _temp) = create_test_service().await;

        service.create_user(new_user("Hana", 1)).await.unwrap();
        let mut duplicate = new_user("Hanna", 2);
        duplicate.phone = new_user("Hana", 1).phone;

        let err = service.create_user(duplicate).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(err, ServiceError::DuplicateUser { ref field } if field == "phone"));
    }

    #[tokio::test]
    async fn test_update_user_reassigns_and_clears_position() {
        let (service, store, _temp) = create_test_service().await;
        let position = store
            .insert_position(NewPosition::new("Engineer", "Builds things"))
            .await
            .unwrap();
        let user = service.create_user(new_user("Hana", 1)).await.unwrap();

        let updated = service
            .update_user(&user.id, UserUpdate::new().with_position(Some(position.id.clone())))
            .await
            .unwrap();
        assert_eq!(updated.position_id, Some(position.id));
        assert_eq!(updated.full_name, "Hana");

        let cleared = service
            .update_user(&user.id, UserUpdate::new().with_position(None))
            .await
            .unwrap();
        assert_eq!(cleared.position_id, None);
    }

    #[tokio::test]
    async fn test_update_user_rejects_unknown_position() {
        let (service, _store, _temp) = create_test_service().await;
        let user = service.create_user(new_user("Hana", 1)).await.unwrap();

        let err = service
            .update_user(&user.id, UserUpdate::new().with_position(Some("missing".to_string())))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(service.get_user(&user.id).await.unwrap().position_id, None);
    }

    #[tokio::test]
    async fn test_delete_user_keeps_photo() {
        let (service, store, _temp) = create_test_service().await;
        let photo = store
            .insert_photo(NewPhoto::new("Badge", "Badge photo", "badge.jpg"))
            .await
            .unwrap();
        let mut input = new_user("Hana", 1);
        input.photo_id = Some(photo.id);
        let user = service.create_user(input).await.unwrap();

        service.delete_user(&user.id).await.unwrap();

        assert_eq!(service.get_user(&user.id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(store.find_photo(photo.id).await.unwrap().is_some());
        assert_eq!(
            service.delete_user(&user.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_users_pages() {
        let (service, _store, _temp) = create_test_service().await;
        for (n, name) in ["Dawit", "Abel", "Chaltu", "Bontu", "Elsa"].iter().enumerate() {
            service
                .create_user(new_user(name, n as u32))
                .await
                .unwrap();
        }

        let page = service
            .list_users(UserQuery {
                q: String::new(),
                page: 2,
                limit: 2,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        let names: Vec<&str> = page.results.iter().map(|u| u.full_name.as_str()).collect();
        assert_eq!(names, vec!["Chaltu", "Dawit"]);
    }

    #[tokio::test]
    async fn test_list_users_rejects_zero_page() {
        let (service, _store, _temp) = create_test_service().await;

        let err = service
            .list_users(UserQuery {
                q: String::new(),
                page: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
