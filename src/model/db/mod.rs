//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs are stored as the document `_id`.
//! - Datetimes are serialised in MongoDB's own format.

pub mod contest;
pub mod contestant;
pub mod vote;
