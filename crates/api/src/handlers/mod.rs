pub mod approval;
pub mod comment;
pub mod notification;
