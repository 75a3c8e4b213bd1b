//! Types shared by the DB and API representations.

mod contest;
mod vote;

pub use contest::{ContestStatus, VotingClosed};
pub use vote::{VoteHash, DEFAULT_VOTE_METHOD};

/// Our contest IDs are integers.
pub type ContestId = u32;
/// Our contestant IDs are integers.
pub type ContestantId = u32;
/// Our vote IDs are integers.
pub type VoteId = u32;
