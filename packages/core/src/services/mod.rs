//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `PositionService` - Hierarchy engine (create, move, cascade delete, tree)
//! - `UserService` - Employee CRUD and paginated listing
//! - `PhotoService` - Photo metadata and view counting
//!
//! Services coordinate between the store traits and application logic,
//! implementing business rules and orchestrating multi-step operations.

pub mod error;
pub mod hierarchy;
pub mod photo_service;
pub mod position_service;
pub mod user_service;

pub use error::{ErrorKind, ServiceError};
pub use hierarchy::{build_hierarchy, plan_deletion, would_create_cycle};
pub use photo_service::PhotoService;
pub use position_service::PositionService;
pub use user_service::UserService;
