//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as plain integers under an `id` field.
//! - Datetimes are serialised as RFC 3339 strings.
//!
//! Incoming types validate themselves before anything touches the database.

pub mod auth;
pub mod contest;
pub mod contestant;
pub mod results;
pub mod vote;

mod validation;
