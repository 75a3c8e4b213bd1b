use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, from_document, serde_helpers::chrono_datetime_as_bson_datetime},
    ClientSession,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{ContestId, ContestantId, VoteHash, VoteId},
    mongodb::Coll,
};

/// A single cast vote, as stored in the database.
///
/// Votes are immutable once inserted.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: VoteId,
    /// Foreign Key contest ID.
    pub contest_id: ContestId,
    /// Foreign Key contestant ID; the contestant belongs to `contest_id`.
    pub contestant_id: ContestantId,
    /// Opaque identifier supplied by the voter's client, e.g. a device token.
    pub voter_identifier: String,
    /// How the vote was submitted.
    pub vote_method: String,
    /// The receipt.
    pub vote_hash: VoteHash,
    /// Submitting IP address, if known.
    pub ip_address: Option<String>,
    /// When the vote was cast.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

/// One row of the per-contestant vote count aggregation.
#[derive(Debug, Deserialize)]
struct VoteCount {
    #[serde(rename = "_id")]
    contestant_id: ContestantId,
    count: u64,
}

impl Vote {
    /// Count the votes for each contestant in the given contest.
    ///
    /// Contestants without votes are absent from the returned map.
    pub async fn counts_for_contest(
        votes: &Coll<Vote>,
        contest_id: ContestId,
        session: &mut ClientSession,
    ) -> Result<HashMap<ContestantId, u64>> {
        let pipeline = [
            doc! { "$match": { "contest_id": contest_id } },
            doc! { "$group": { "_id": "$contestant_id", "count": { "$sum": 1 } } },
        ];
        let mut cursor = votes
            .aggregate_with_session(pipeline, None, session)
            .await?;
        let mut counts = HashMap::new();
        while let Some(row) = cursor.next(session).await {
            let row: VoteCount = from_document(row?)?;
            counts.insert(row.contestant_id, row.count);
        }
        Ok(counts)
    }
}
