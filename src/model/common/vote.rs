use std::fmt::{Display, Formatter};

use chrono::{DateTime, SecondsFormat, Utc};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ContestId, ContestantId};

/// The vote method recorded when the voter does not supply one.
pub const DEFAULT_VOTE_METHOD: &str = "web";

/// A vote receipt: a SHA-256 digest over the fields identifying the vote,
/// rendered as lowercase hex.
///
/// Each field is length-prefixed before hashing, so distinct inputs can never
/// concatenate to the same byte string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteHash(String);

impl VoteHash {
    pub fn new(
        contest_id: ContestId,
        contestant_id: ContestantId,
        voter_identifier: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let contest_id = contest_id.to_string();
        let contestant_id = contestant_id.to_string();
        let timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);

        let mut hasher = Sha256::new();
        for field in [
            contest_id.as_bytes(),
            contestant_id.as_bytes(),
            voter_identifier.as_bytes(),
            timestamp.as_bytes(),
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        Self(HEXLOWER.encode(&hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VoteHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, TimeZone};

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn hash_is_deterministic_hex() {
        let a = VoteHash::new(1, 2, "voter-001", fixed_time());
        let b = VoteHash::new(1, 2, "voter-001", fixed_time());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn every_field_changes_the_hash() {
        let base = VoteHash::new(1, 2, "voter-001", fixed_time());
        assert_ne!(base, VoteHash::new(3, 2, "voter-001", fixed_time()));
        assert_ne!(base, VoteHash::new(1, 3, "voter-001", fixed_time()));
        assert_ne!(base, VoteHash::new(1, 2, "voter-002", fixed_time()));
        assert_ne!(
            base,
            VoteHash::new(1, 2, "voter-001", fixed_time() + Duration::milliseconds(1))
        );
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        // "1" + "23" and "12" + "3" would collide under plain concatenation.
        let a = VoteHash::new(1, 23, "voter-001", fixed_time());
        let b = VoteHash::new(12, 3, "voter-001", fixed_time());
        assert_ne!(a, b);
    }

    #[test]
    fn many_votes_have_distinct_hashes() {
        let mut hashes = HashSet::new();
        for contest_id in 1..=10 {
            for voter in 0..50 {
                let voter_identifier = format!("voter-{voter:03}");
                let hash = VoteHash::new(contest_id, voter % 3, &voter_identifier, fixed_time());
                assert!(hashes.insert(hash));
            }
        }
        assert_eq!(hashes.len(), 500);
    }
}
