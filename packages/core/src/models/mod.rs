//! Data Models
//!
//! This module contains the core data structures used throughout OrgChart:
//!
//! - `Position` - Node of the organizational hierarchy
//! - `User` - Employee assigned to (at most) one position
//! - `Photo` - Metadata of an employee photo
//!
//! Relations are plain identifiers. Children of a position and the users
//! assigned to it are derived by query, never stored as back-references.

mod photo;
mod position;
mod user;
mod validation;

pub use photo::{NewPhoto, Photo, PhotoUpdate};
pub use position::{NewPosition, Position, PositionDetails, PositionTreeNode, PositionUpdate};
pub use user::{Gender, NewUser, User, UserPage, UserQuery, UserUpdate, MAX_PAGE_LIMIT};
pub use validation::ValidationError;
