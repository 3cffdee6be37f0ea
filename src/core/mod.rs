//! Core module - fundamental types and utilities

pub mod config;
pub mod entity;
pub mod error;
pub mod identity;
pub mod project;
pub mod store;

pub use config::Config;
pub use entity::Entity;
pub use error::{ErrorBody, ErrorKind, Result, ShgError};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Workspace, WorkspaceError};
pub use store::Store;
