use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{ContestId, ContestantId, VoteHash, VoteId, DEFAULT_VOTE_METHOD},
    db::vote::Vote,
};

use super::validation::{
    check_length, VOTER_IDENTIFIER_LENGTH, VOTE_METHOD_LENGTH,
};

/// Message returned with every successful vote.
pub const VOTE_RECORDED: &str = "Vote recorded successfully!";

fn default_vote_method() -> String {
    DEFAULT_VOTE_METHOD.to_string()
}

/// A vote that a voter wishes to cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub contest_id: ContestId,
    pub contestant_id: ContestantId,
    pub voter_identifier: String,
    #[serde(default = "default_vote_method")]
    pub vote_method: String,
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl VoteRequest {
    /// Check the request is well-formed.
    pub fn validate(&self) -> Result<()> {
        check_length(
            "voter_identifier",
            &self.voter_identifier,
            VOTER_IDENTIFIER_LENGTH,
        )?;
        check_length("vote_method", &self.vote_method, VOTE_METHOD_LENGTH)?;
        if let Some(ref ip_address) = self.ip_address {
            ip_address.parse::<IpAddr>().map_err(|_| {
                Error::validation(format!("`ip_address` is not an IP address: {ip_address}"))
            })?;
        }
        Ok(())
    }

    /// Convert this request into a vote with the given ID, cast at `timestamp`.
    pub fn into_vote(self, id: VoteId, timestamp: DateTime<Utc>) -> Vote {
        let vote_hash = VoteHash::new(
            self.contest_id,
            self.contestant_id,
            &self.voter_identifier,
            timestamp,
        );
        Vote {
            id,
            contest_id: self.contest_id,
            contestant_id: self.contestant_id,
            voter_identifier: self.voter_identifier,
            vote_method: self.vote_method,
            vote_hash,
            ip_address: self.ip_address,
            timestamp,
        }
    }
}

/// The voter's receipt for a recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub id: VoteId,
    pub contest_id: ContestId,
    pub contestant_id: ContestantId,
    pub vote_hash: VoteHash,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl From<Vote> for VoteReceipt {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id,
            contest_id: vote.contest_id,
            contestant_id: vote.contestant_id,
            vote_hash: vote.vote_hash,
            timestamp: vote.timestamp,
            message: VOTE_RECORDED.to_string(),
        }
    }
}
