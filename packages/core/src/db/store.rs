//! Store Traits - Database Abstraction Layer
//!
//! Traits that abstract persistence for positions, users and photos. The
//! services depend only on these traits, so business logic never touches
//! SQL and tests can swap the backend.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every method is async
//! 2. **Ownership Semantics**: inputs are taken by value where they are stored
//! 3. **Error Handling**: `anyhow::Result` for flexible error context; the
//!    services translate failures into `ServiceError`
//! 4. **Atomic cascade**: multi-row deletion goes through [`CascadeStore`]
//!    so it runs inside a single transaction
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgchart_core::db::{DatabaseService, LibsqlStore, OrgStore};
//! use orgchart_core::models::NewPosition;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgchart.db")).await?);
//!     let store: Arc<dyn OrgStore> = Arc::new(LibsqlStore::new(db));
//!
//!     let ceo = store
//!         .insert_position(NewPosition::new("CEO", "Chief Executive Officer"))
//!         .await?;
//!     let children = store.find_positions_by_parent(&ceo.id).await?;
//!     assert!(children.is_empty());
//!     Ok(())
//! }
//! ```

use crate::models::{
    NewPhoto, NewPosition, NewUser, Photo, Position, User, UserQuery,
};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence for the position table
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Get a position by ID (`None` if it does not exist)
    async fn find_position(&self, id: &str) -> Result<Option<Position>>;

    /// Every position in creation order
    async fn find_all_positions(&self) -> Result<Vec<Position>>;

    /// Direct children of `parent_id` in creation order
    ///
    /// An unknown parent yields an empty vector.
    async fn find_positions_by_parent(&self, parent_id: &str) -> Result<Vec<Position>>;

    /// Insert a new position, generating its ID and timestamps
    ///
    /// The caller is responsible for checking that `parent_id` exists; the
    /// foreign key rejects a dangling reference.
    async fn insert_position(&self, position: NewPosition) -> Result<Position>;

    /// Overwrite name, description and parent of an existing position
    ///
    /// Refreshes `modified_at` and returns the stored row.
    async fn update_position(&self, position: Position) -> Result<Position>;

    /// Delete a single position row
    ///
    /// Returns `false` if nothing was deleted. Fails if the position still
    /// has children; use [`CascadeStore::apply_deletion`] for the cascade.
    async fn delete_position(&self, id: &str) -> Result<bool>;
}

/// Persistence for the user table
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Users assigned to `position_id`, ordered by name
    async fn find_users_by_position(&self, position_id: &str) -> Result<Vec<User>>;

    /// Returns `false` if no user had this ID
    async fn delete_user(&self, id: &str) -> Result<bool>;

    /// Insert a user, generating its ID
    ///
    /// Unique email/phone violations surface as errors carrying the SQLite
    /// `UNIQUE constraint failed` message.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    /// Overwrite every column of an existing user
    async fn update_user(&self, user: User) -> Result<User>;

    /// One page of users plus the total number of matches
    async fn list_users(&self, query: &UserQuery) -> Result<(Vec<User>, u64)>;
}

/// Persistence for the photo table
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Returns `false` if no photo had this ID
    ///
    /// Users referencing the photo have their `photo_id` cleared.
    async fn delete_photo(&self, id: i64) -> Result<bool>;

    /// Insert photo metadata; `views` starts at 0
    async fn insert_photo(&self, photo: NewPhoto) -> Result<Photo>;

    async fn find_photo(&self, id: i64) -> Result<Option<Photo>>;

    async fn find_photo_by_filename(&self, filename: &str) -> Result<Option<Photo>>;

    async fn list_photos(&self) -> Result<Vec<Photo>>;

    /// Overwrite name, description, filename and published flag
    async fn update_photo(&self, photo: Photo) -> Result<Photo>;

    /// Atomically add one to the view counter
    ///
    /// Returns the updated photo, or `None` if it does not exist.
    async fn increment_photo_views(&self, id: i64) -> Result<Option<Photo>>;
}

/// A position cascade, computed before any write
///
/// Built by `services::hierarchy::plan_deletion` from the target, its users
/// and its children. Only `target_id` and `new_parent_id` drive the writes;
/// the id lists are a planning-time snapshot used for logging, since the
/// store selects children, users and photos by their current assignment
/// inside the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Position being deleted
    pub target_id: String,

    /// Where the target's children move to (`None` promotes them to roots)
    pub new_parent_id: Option<String>,

    /// Direct children of the target at planning time (informational)
    pub child_ids: Vec<String>,

    /// Users assigned to the target at planning time (informational)
    pub user_ids: Vec<String>,

    /// Photos owned by those users at planning time (informational)
    pub photo_ids: Vec<i64>,
}

/// Row counts reported by a committed cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub reparented_children: u64,
    pub deleted_users: u64,
    pub deleted_photos: u64,
}

/// Outcome of [`CascadeStore::apply_deletion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeResult {
    /// All steps committed
    Applied(DeletionOutcome),

    /// The target disappeared before the transaction started; nothing changed
    TargetMissing,
}

/// Atomic execution of a [`DeletionPlan`]
#[async_trait]
pub trait CascadeStore: Send + Sync {
    /// Run the plan as one transaction
    ///
    /// Steps, in order: re-parent every current child of the target, delete
    /// the photos of users currently assigned to it, delete those users,
    /// delete the target. Any failure rolls back every step.
    async fn apply_deletion(&self, plan: &DeletionPlan) -> Result<CascadeResult>;
}

/// Combined store used by the services
pub trait OrgStore: PositionStore + UserStore + PhotoStore + CascadeStore {}

impl<T> OrgStore for T where T: PositionStore + UserStore + PhotoStore + CascadeStore {}
