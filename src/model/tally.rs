//! Live standings for a contest.

use std::collections::HashMap;

use mongodb::{bson::doc, options::FindOptions, options::SessionOptions, Client};

use crate::error::{Error, Result};
use crate::model::{
    api::results::{ContestResults, ContestantResult},
    common::{ContestId, ContestantId},
    db::{contest::Contest, contestant::Contestant, vote::Vote},
    mongodb::{u32_id_filter, Coll},
};

/// A contest, its contestants and their vote counts, all read from a single
/// consistent snapshot of the database.
#[derive(Debug, Clone)]
pub struct ContestSnapshot {
    pub contest: Contest,
    /// Ordered by ID.
    pub contestants: Vec<Contestant>,
    /// Contestants without votes may be absent.
    pub counts: HashMap<ContestantId, u64>,
}

impl ContestSnapshot {
    /// Read the given contest and everything needed to tally it.
    pub async fn read(
        db_client: &Client,
        contests: &Coll<Contest>,
        contestants: &Coll<Contestant>,
        votes: &Coll<Vote>,
        contest_id: ContestId,
    ) -> Result<Self> {
        let options = SessionOptions::builder().snapshot(true).build();
        let mut session = db_client.start_session(Some(options)).await?;

        let contest = contests
            .find_one_with_session(u32_id_filter(contest_id), None, &mut session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Contest {contest_id}")))?;

        let sort = FindOptions::builder().sort(doc! {"_id": 1}).build();
        let mut cursor = contestants
            .find_with_session(doc! {"contest_id": contest_id}, sort, &mut session)
            .await?;
        let mut contest_contestants = Vec::new();
        while let Some(contestant) = cursor.next(&mut session).await {
            contest_contestants.push(contestant?);
        }

        let counts = Vote::counts_for_contest(votes, contest_id, &mut session).await?;

        Ok(Self {
            contest,
            contestants: contest_contestants,
            counts,
        })
    }

    /// The number of votes for the given contestant.
    pub fn count_for(&self, contestant_id: ContestantId) -> u64 {
        self.counts.get(&contestant_id).copied().unwrap_or(0)
    }

    /// Compute the standings.
    pub fn tally(&self) -> ContestResults {
        let total_votes: u64 = self
            .contestants
            .iter()
            .map(|contestant| self.count_for(contestant.id))
            .sum();

        let mut results: Vec<_> = self
            .contestants
            .iter()
            .map(|contestant| {
                let vote_count = self.count_for(contestant.id);
                ContestantResult {
                    contestant_id: contestant.id,
                    contestant_name: contestant.name.clone(),
                    vote_count,
                    percentage: percentage(vote_count, total_votes),
                }
            })
            .collect();
        results.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then(a.contestant_id.cmp(&b.contestant_id))
        });

        ContestResults {
            contest_id: self.contest.id,
            contest_name: self.contest.name.clone(),
            total_votes,
            results,
        }
    }
}

/// `count` as a percentage of `total`, rounded half away from zero to two
/// decimal places. Zero if there are no votes at all.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let exact = count as f64 / total as f64 * 100.0;
    (exact * 100.0).round() / 100.0
}
