use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// States in the contest lifecycle.
///
/// The status is set explicitly by an administrator and is never derived
/// from the contest's time window.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    /// Under construction.
    #[default]
    Draft,
    /// Open for voting while inside its time window.
    Active,
    /// No longer accepting votes.
    Closed,
}

impl From<ContestStatus> for Bson {
    fn from(status: ContestStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// The reason a contest is not accepting votes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum VotingClosed {
    #[error("Contest has not started yet")]
    NotStarted,
    #[error("Contest has ended")]
    Ended,
    #[error("Contest is not active")]
    NotActive,
}
