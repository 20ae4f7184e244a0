//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO used by the repositories and stores for inserts

pub mod approval;
pub mod comment;
pub mod content;
pub mod history;
pub mod notification;
pub mod user;
