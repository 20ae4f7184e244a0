//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- the caller, from a `Bearer` token in the
//!   `Authorization` header.
//! - [`auth::LiveAuthUser`] -- same, but also accepts a `token` query
//!   parameter, for WebSocket clients that cannot set headers.

pub mod auth;
