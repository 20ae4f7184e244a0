//! Domain types shared by every Cadence crate.
//!
//! Nothing in here performs I/O: it holds the id/timestamp aliases, the
//! domain error type, the approval lifecycle enums and the pure rules the
//! review workflow and notification pipeline are built on.

pub mod approval;
pub mod error;
pub mod identity;
pub mod notification;
pub mod review;
pub mod types;
