//! The approval workflow: lifecycle transitions, comment threads and the
//! audit trail, with notifications emitted for every participant-facing
//! change.

pub mod service;
pub mod thread;

pub use service::{ApprovalView, ReviewRequest, ReviewService};
pub use thread::{build_thread, CommentNode};
