//! Database Layer
//!
//! This module handles all database interactions using libsql (embedded
//! SQLite):
//!
//! - Database initialization and connection management
//! - Store traits that the services depend on
//! - The libsql implementation of those traits, including the atomic
//!   position cascade
//!
//! # Architecture
//!
//! Positions, users and photos each live in their own table. The position
//! hierarchy is an adjacency list (`positions.parent_id`); all tree logic
//! runs in the service layer over flat query results.

mod database;
mod error;
mod libsql_store;
mod store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use libsql_store::LibsqlStore;
pub use store::{
    CascadeResult, CascadeStore, DeletionOutcome, DeletionPlan, OrgStore, PhotoStore,
    PositionStore, UserStore,
};
