use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{ContestId, ContestStatus, VotingClosed};

/// Core contest data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ContestCore {
    /// Contest name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Voting opens at this time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    /// Voting closes after this time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    /// Name of the client running the contest.
    pub client_name: Option<String>,
    /// Lifecycle status.
    pub status: ContestStatus,
    /// Creation time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ContestCore {
    /// Check whether this contest accepts votes at time `now`.
    ///
    /// The start time, end time and status are checked in that order, and
    /// the first failure is reported. Both ends of the window are inclusive.
    pub fn voting_open(&self, now: DateTime<Utc>) -> Result<(), VotingClosed> {
        if now < self.start_date {
            return Err(VotingClosed::NotStarted);
        }
        if now > self.end_date {
            return Err(VotingClosed::Ended);
        }
        if self.status != ContestStatus::Active {
            return Err(VotingClosed::NotActive);
        }
        Ok(())
    }
}

/// A contest from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Contest {
    #[serde(rename = "_id")]
    pub id: ContestId,
    #[serde(flatten)]
    pub contest: ContestCore,
}

impl Deref for Contest {
    type Target = ContestCore;

    fn deref(&self) -> &Self::Target {
        &self.contest
    }
}

impl DerefMut for Contest {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.contest
    }
}


#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        (start, start + Duration::hours(8))
    }

    #[test]
    fn open_inside_window_when_active() {
        let (start, end) = window();
        let contest = ContestCore::example(ContestStatus::Active, start, end);
        assert_eq!(contest.voting_open(start), Ok(()));
        assert_eq!(contest.voting_open(start + Duration::hours(1)), Ok(()));
        assert_eq!(contest.voting_open(end), Ok(()));
    }

    #[test]
    fn rejects_before_start() {
        let (start, end) = window();
        let contest = ContestCore::example(ContestStatus::Active, start, end);
        assert_eq!(
            contest.voting_open(start - Duration::milliseconds(1)),
            Err(VotingClosed::NotStarted)
        );
    }

    #[test]
    fn rejects_after_end() {
        let (start, end) = window();
        let contest = ContestCore::example(ContestStatus::Active, start, end);
        assert_eq!(
            contest.voting_open(end + Duration::milliseconds(1)),
            Err(VotingClosed::Ended)
        );
    }

    #[test]
    fn rejects_inactive_inside_window() {
        let (start, end) = window();
        let inside = start + Duration::hours(1);
        for status in [ContestStatus::Draft, ContestStatus::Closed] {
            let contest = ContestCore::example(status, start, end);
            assert_eq!(contest.voting_open(inside), Err(VotingClosed::NotActive));
        }
    }

    #[test]
    fn time_checks_come_before_status() {
        let (start, end) = window();
        let contest = ContestCore::example(ContestStatus::Closed, start, end);
        assert_eq!(
            contest.voting_open(start - Duration::hours(1)),
            Err(VotingClosed::NotStarted)
        );
        assert_eq!(
            contest.voting_open(end + Duration::hours(1)),
            Err(VotingClosed::Ended)
        );
    }
}
