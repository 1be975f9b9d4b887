//! OrgChart Core Business Logic Layer
//!
//! This crate provides data management for an organizational chart: the
//! position hierarchy, the employees assigned to positions, and their photos.
//!
//! # Architecture
//!
//! - **Adjacency list**: positions store an optional `parent_id`; trees are
//!   built in memory from one flat read
//! - **libsql**: embedded SQLite-compatible database, one connection per call
//! - **Explicit cascade**: deletion policy is computed in the service layer
//!   and applied in a single transaction
//!
//! # Modules
//!
//! - [`models`] - Data structures (Position, User, Photo) and validation
//! - [`services`] - Business services (PositionService, UserService, PhotoService)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
