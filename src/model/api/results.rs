use serde::{Deserialize, Serialize};

use crate::model::common::{ContestId, ContestantId};

/// The current standings of a contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestResults {
    pub contest_id: ContestId,
    pub contest_name: String,
    pub total_votes: u64,
    /// Ordered by `vote_count` descending, then `contestant_id` ascending.
    pub results: Vec<ContestantResult>,
}

/// One contestant's standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestantResult {
    pub contestant_id: ContestantId,
    pub contestant_name: String,
    pub vote_count: u64,
    /// Share of the total, in percent, rounded to two decimal places.
    pub percentage: f64,
}
