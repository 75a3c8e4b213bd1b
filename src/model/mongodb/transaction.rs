use std::future::Future;

use log::debug;
use mongodb::bson::{doc, Document};

use crate::error::Result;

/// Name of the field bumped by [`touch`].
const REVISION: &str = "revision";

/// An update bumping a document's revision.
///
/// A transaction that reads a document and relies on it continuing to exist
/// touches it, so that a concurrent transaction deleting it hits a write
/// conflict instead of committing alongside.
pub fn touch() -> Document {
    doc! {
        "$inc": { REVISION: 1 },
    }
}

/// Run `attempt` until it succeeds or fails with a non-transient error.
///
/// Each call of `attempt` must start its own transaction.
pub async fn retry_transient<T, F, Fut>(what: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    loop {
        match attempt().await {
            Err(err) if err.is_transient() => debug!("Retrying {what}: {err}"),
            result => return result,
        }
    }
}
