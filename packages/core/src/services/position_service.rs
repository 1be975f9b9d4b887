//! Position Service - Hierarchy Engine
//!
//! Business rules for the position tree:
//!
//! - Creation validates the parent reference before writing
//! - Updates are partial; re-parenting rejects unknown parents and cycles
//! - Deletion cascades: children move up to the deleted position's parent,
//!   assigned users and their photos are destroyed, all in one transaction
//! - Hierarchy materialization turns the flat table into a nested forest
//!
//! Validation always happens before any write, so a rejected request leaves
//! storage untouched.

use crate::db::{CascadeResult, DeletionOutcome, OrgStore};
use crate::models::{
    NewPosition, Position, PositionDetails, PositionTreeNode, PositionUpdate,
};
use crate::services::error::{store_error, ServiceError};
use crate::services::hierarchy::{build_hierarchy, plan_deletion, would_create_cycle};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Hierarchy engine over an [`OrgStore`]
///
/// # Examples
///
/// ```rust,no_run
/// use orgchart_core::db::{DatabaseService, LibsqlStore};
/// use orgchart_core::models::NewPosition;
/// use orgchart_core::services::PositionService;
/// use std::path::PathBuf;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgchart.db")).await?);
///     let service = PositionService::new(Arc::new(LibsqlStore::new(db)));
///
///     let ceo = service
///         .create_position(NewPosition::new("CEO", "Chief Executive Officer"))
///         .await?;
///     service
///         .create_position(NewPosition::new("CTO", "Technology").with_parent(&ceo.id))
///         .await?;
///
///     let forest = service.get_position_hierarchy().await?;
///     assert_eq!(forest[0].children.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct PositionService {
    store: Arc<dyn OrgStore>,
}

impl PositionService {
    pub fn new(store: Arc<dyn OrgStore>) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &Arc<dyn OrgStore> {
        &self.store
    }

    async fn require_position(&self, id: &str) -> Result<Position, ServiceError> {
        self.store
            .find_position(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::position_not_found(id))
    }

    /// Create a position, optionally under an existing parent
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if name or description is blank
    /// - `ParentNotFound` if `parent_id` does not resolve (nothing is written)
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_position(&self, input: NewPosition) -> Result<Position, ServiceError> {
        input.validate()?;

        if let Some(parent_id) = input.parent_id.as_deref() {
            let parent = self
                .store
                .find_position(parent_id)
                .await
                .map_err(store_error)?;
            if parent.is_none() {
                warn!(parent_id, "Rejected position: parent does not exist");
                return Err(ServiceError::parent_not_found(parent_id));
            }
        }

        let position = self
            .store
            .insert_position(input)
            .await
            .map_err(store_error)?;

        info!(position_id = %position.id, parent_id = ?position.parent_id, "Created position");
        Ok(position)
    }

    /// Apply a partial update
    ///
    /// An empty update returns the stored position without writing.
    ///
    /// # Errors
    ///
    /// - `PositionNotFound` if `id` does not resolve
    /// - `ValidationFailed` if a supplied name or description is blank
    /// - `InvalidParent` if a supplied parent does not resolve
    /// - `CircularReference` if the new parent is the position itself or a
    ///   descendant of it
    #[instrument(skip(self, update))]
    pub async fn update_position(
        &self,
        id: &str,
        update: PositionUpdate,
    ) -> Result<Position, ServiceError> {
        let mut position = self.require_position(id).await?;

        if update.is_empty() {
            debug!("Empty update; returning position unchanged");
            return Ok(position);
        }

        update.validate()?;

        if let Some(Some(parent_id)) = update.parent_id.as_ref() {
            self.validate_new_parent(id, parent_id).await?;
        }

        position.apply_update(update);
        let updated = self
            .store
            .update_position(position)
            .await
            .map_err(store_error)?;

        info!(parent_id = ?updated.parent_id, "Updated position");
        Ok(updated)
    }

    async fn validate_new_parent(&self, id: &str, parent_id: &str) -> Result<(), ServiceError> {
        if parent_id == id {
            warn!("Rejected re-parent: position cannot be its own parent");
            return Err(ServiceError::circular_reference(format!(
                "Position {} cannot be its own parent",
                id
            )));
        }

        let parent = self
            .store
            .find_position(parent_id)
            .await
            .map_err(store_error)?;
        if parent.is_none() {
            warn!(parent_id, "Rejected re-parent: parent not found");
            return Err(ServiceError::invalid_parent(parent_id));
        }

        let positions = self.store.find_all_positions().await.map_err(store_error)?;
        if would_create_cycle(&positions, id, parent_id) {
            warn!(parent_id, "Rejected re-parent: would create a cycle");
            return Err(ServiceError::circular_reference(format!(
                "Cannot move position {} under its descendant {}",
                id, parent_id
            )));
        }

        Ok(())
    }

    /// Delete a position and cascade to its dependents
    ///
    /// Children are re-parented to the deleted position's parent (or become
    /// roots), assigned users and their photos are deleted. The whole cascade
    /// commits or rolls back as one unit.
    ///
    /// # Errors
    ///
    /// - `PositionNotFound` if `id` does not resolve, including when a
    ///   concurrent request deleted it first
    /// - `QueryFailed` if any cascade step fails; nothing is changed
    #[instrument(skip(self))]
    pub async fn delete_position(&self, id: &str) -> Result<DeletionOutcome, ServiceError> {
        let target = self.require_position(id).await?;
        let children = self
            .store
            .find_positions_by_parent(id)
            .await
            .map_err(store_error)?;
        let users = self
            .store
            .find_users_by_position(id)
            .await
            .map_err(store_error)?;

        let plan = plan_deletion(&target, &children, &users);
        debug!(
            children = plan.child_ids.len(),
            users = plan.user_ids.len(),
            photos = plan.photo_ids.len(),
            "Planned position deletion"
        );

        match self.store.apply_deletion(&plan).await.map_err(store_error)? {
            CascadeResult::Applied(outcome) => {
                info!(
                    reparented_children = outcome.reparented_children,
                    deleted_users = outcome.deleted_users,
                    deleted_photos = outcome.deleted_photos,
                    "Deleted position"
                );
                Ok(outcome)
            }
            CascadeResult::TargetMissing => {
                warn!("Position disappeared before the cascade started");
                Err(ServiceError::position_not_found(id))
            }
        }
    }

    /// Every position as a flat list in creation order
    #[instrument(skip(self))]
    pub async fn list_positions(&self) -> Result<Vec<Position>, ServiceError> {
        self.store.find_all_positions().await.map_err(store_error)
    }

    /// A position with its parent, direct children and assigned users
    #[instrument(skip(self))]
    pub async fn get_position(&self, id: &str) -> Result<PositionDetails, ServiceError> {
        let position = self.require_position(id).await?;

        let parent = match position.parent_id.as_deref() {
            Some(parent_id) => self
                .store
                .find_position(parent_id)
                .await
                .map_err(store_error)?,
            None => None,
        };
        let children = self
            .store
            .find_positions_by_parent(id)
            .await
            .map_err(store_error)?;
        let users = self
            .store
            .find_users_by_position(id)
            .await
            .map_err(store_error)?;

        Ok(PositionDetails {
            position,
            parent,
            children,
            users,
        })
    }

    /// The whole organization as a nested forest
    ///
    /// One flat read, then an in-memory build. Storage failures are logged
    /// with detail and reported as `Internal`.
    #[instrument(skip(self))]
    pub async fn get_position_hierarchy(&self) -> Result<Vec<PositionTreeNode>, ServiceError> {
        let positions = self.store.find_all_positions().await.map_err(|e| {
            tracing::error!("Failed to load positions for hierarchy: {:#}", e);
            ServiceError::internal("failed to build hierarchy")
        })?;

        let forest = build_hierarchy(&positions);
        debug!(
            positions = positions.len(),
            roots = forest.len(),
            "Built position hierarchy"
        );
        Ok(forest)
    }

    /// Direct children of `id`
    ///
    /// Unknown ids and leaves both yield an empty vector.
    #[instrument(skip(self))]
    pub async fn get_children(&self, id: &str) -> Result<Vec<Position>, ServiceError> {
        self.store
            .find_positions_by_parent(id)
            .await
            .map_err(store_error)
    }
}
