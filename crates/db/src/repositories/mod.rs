//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod approval_repo;
pub mod comment_repo;
pub mod content_repo;
pub mod history_repo;
pub mod notification_repo;
pub mod user_repo;

pub use approval_repo::ApprovalRepo;
pub use comment_repo::CommentRepo;
pub use content_repo::ContentRepo;
pub use history_repo::HistoryRepo;
pub use notification_repo::NotificationRepo;
pub use user_repo::UserRepo;
