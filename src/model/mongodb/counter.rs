use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// Counter for contest IDs.
pub const CONTEST_ID_COUNTER: &str = "contest_id";
/// Counter for contestant IDs.
pub const CONTESTANT_ID_COUNTER: &str = "contestant_id";
/// Counter for vote IDs.
pub const VOTE_ID_COUNTER: &str = "vote_id";

const ALL_COUNTERS: [&str; 3] = [CONTEST_ID_COUNTER, CONTESTANT_ID_COUNTER, VOTE_ID_COUNTER];

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Create a new `Counter` with the given ID, starting at the given value.
    pub fn new(id: impl Into<String>, start: u32) -> Self {
        Self {
            id: id.into(),
            next: start,
        }
    }

    /// Atomically retrieve the next value of the counter with the given ID.
    ///
    /// Must be called outside any transaction. A value taken by an operation
    /// that later aborts is skipped, so IDs may have gaps.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| Error::Internal(format!("Failed to find counter with ID {id}")))?;
        Ok(counter.next)
    }
}

/// Ensure every ID counter exists, starting new ones at 1.
///
/// This operation is idempotent and never resets an existing counter.
pub async fn ensure_counters_exist(counters: &Coll<Counter>) -> Result<()> {
    let upsert = UpdateOptions::builder().upsert(true).build();
    for id in ALL_COUNTERS {
        let update = doc! {
            "$setOnInsert": { "next": 1 }
        };
        counters
            .update_one(doc! { "_id": id }, update, upsert.clone())
            .await?;
    }
    Ok(())
}
