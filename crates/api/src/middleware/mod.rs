//! Request extractors and middleware.
//!
//! - [`actor::CurrentUser`] -- Resolves the acting user from the `X-User-Id` header.
//! - [`activity::record_activity`] -- Stamps `last_active` after a successful request.

pub mod activity;
pub mod actor;
