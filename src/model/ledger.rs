//! Recording votes.

use chrono::{DateTime, Utc};
use log::{debug, info};
use mongodb::{bson::doc, Client};

use crate::error::{Error, Result};
use crate::model::{
    api::vote::VoteRequest,
    db::{contest::Contest, contestant::Contestant, vote::Vote},
    mongodb::{
        is_duplicate_key_error, retry_transient, touch, u32_id_filter, Coll, Counter,
        CONTEST_VOTER_INDEX, VOTE_HASH_INDEX, VOTE_ID_COUNTER,
    },
};

/// Reason given when a voter tries to vote twice in one contest.
pub const ALREADY_VOTED: &str = "You have already voted in this contest";

/// Record a vote cast at time `now`, returning the stored vote.
///
/// The contest must exist and be open at `now`, and the contestant must
/// belong to it. Each voter identifier may vote at most once per contest;
/// of several concurrent attempts, exactly one succeeds.
pub async fn cast_vote(
    request: VoteRequest,
    now: DateTime<Utc>,
    db_client: &Client,
    contests: &Coll<Contest>,
    contestants: &Coll<Contestant>,
    votes: &Coll<Vote>,
    counters: &Coll<Counter>,
) -> Result<Vote> {
    request.validate()?;
    // Store exactly what the database can represent, so the hash in the
    // receipt can be recomputed from the stored timestamp.
    let now = mongodb::bson::DateTime::from_chrono(now).to_chrono();

    retry_transient("vote", || {
        record_vote(
            request.clone(),
            now,
            db_client,
            contests,
            contestants,
            votes,
            counters,
        )
    })
    .await
}

/// One attempt at recording a vote, in its own transaction.
async fn record_vote(
    request: VoteRequest,
    now: DateTime<Utc>,
    db_client: &Client,
    contests: &Coll<Contest>,
    contestants: &Coll<Contestant>,
    votes: &Coll<Vote>,
    counters: &Coll<Counter>,
) -> Result<Vote> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let contest = contests
        .find_one_with_session(u32_id_filter(request.contest_id), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Contest {}", request.contest_id)))?;
    contest.voting_open(now)?;

    // Deleting the contestant, or its contest, now conflicts with this vote.
    let contestant_filter = doc! {
        "_id": request.contestant_id,
        "contest_id": request.contest_id,
    };
    let touched = contestants
        .update_one_with_session(contestant_filter, touch(), None, &mut session)
        .await?;
    if touched.matched_count == 0 {
        return Err(Error::not_found(format!(
            "Contestant {} in contest {}",
            request.contestant_id, request.contest_id
        )));
    }

    let id = Counter::next(counters, VOTE_ID_COUNTER).await?;
    let vote = request.into_vote(id, now);
    if let Err(err) = votes.insert_one_with_session(&vote, None, &mut session).await {
        if is_duplicate_key_error(&err, CONTEST_VOTER_INDEX) {
            debug!(
                "Rejected repeat vote by {} in contest {}",
                vote.voter_identifier, vote.contest_id
            );
            return Err(Error::Conflict(ALREADY_VOTED.to_string()));
        }
        if is_duplicate_key_error(&err, VOTE_HASH_INDEX) {
            return Err(Error::Internal(format!("Vote hash collision: {}", vote.vote_hash)));
        }
        return Err(err.into());
    }

    session.commit_transaction().await?;
    info!(
        "Recorded vote {} for contestant {} in contest {}",
        vote.id, vote.contestant_id, vote.contest_id
    );
    Ok(vote)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Duration;
    use rocket::futures::{future::join_all, TryStreamExt};
    use rocket::local::asynchronous::Client;

    use super::*;
    use crate::model::{
        common::{ContestStatus, VoteHash, VotingClosed},
        db::contest::{examples::now, ContestCore},
    };

    /// Everything `cast_vote` needs.
    struct Ledger {
        db_client: mongodb::Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    }

    impl Ledger {
        /// Insert contest 1 with the given window and status, holding
        /// contestants 1 and 2. Contest 2 is open and holds contestant 3.
        async fn new(
            client: &Client,
            contests: Coll<Contest>,
            contestants: Coll<Contestant>,
            votes: Coll<Vote>,
            counters: Coll<Counter>,
            contest: ContestCore,
        ) -> Self {
            contests
                .insert_many(
                    [
                        Contest::example(1, contest),
                        Contest::example(2, ContestCore::open_example()),
                    ],
                    None,
                )
                .await
                .unwrap();
            contestants
                .insert_many(
                    [
                        Contestant::example(1, 1, "Ade"),
                        Contestant::example(2, 1, "Bola"),
                        Contestant::example(3, 2, "Chi"),
                    ],
                    None,
                )
                .await
                .unwrap();
            let db_client = client.rocket().state::<mongodb::Client>().unwrap().clone();
            Self {
                db_client,
                contests,
                contestants,
                votes,
                counters,
            }
        }

        async fn cast(&self, request: VoteRequest, at: DateTime<Utc>) -> Result<Vote> {
            cast_vote(
                request,
                at,
                &self.db_client,
                &self.contests,
                &self.contestants,
                &self.votes,
                &self.counters,
            )
            .await
        }

        async fn vote_count(&self) -> u64 {
            self.votes.count_documents(None, None).await.unwrap()
        }
    }

    #[backend_test]
    async fn records_vote(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        let now = now();
        let vote = ledger
            .cast(VoteRequest::example(1, 2, "voter-001"), now)
            .await
            .unwrap();
        assert_eq!(vote.contest_id, 1);
        assert_eq!(vote.contestant_id, 2);
        assert_eq!(vote.timestamp, now);
        assert_eq!(vote.vote_hash, VoteHash::new(1, 2, "voter-001", now));

        let stored = ledger
            .votes
            .find_one(u32_id_filter(vote.id), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, vote);
    }

    #[backend_test]
    async fn second_vote_in_same_contest_conflicts(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        ledger
            .cast(VoteRequest::example(1, 1, "voter-001"), now())
            .await
            .unwrap();

        // Switching contestant doesn't help.
        let result = ledger
            .cast(VoteRequest::example(1, 2, "voter-001"), now())
            .await;
        match result {
            Err(Error::Conflict(reason)) => assert_eq!(reason, ALREADY_VOTED),
            other => panic!("Expected conflict, got {other:?}"),
        }

        // The same voter may still vote in another contest.
        ledger
            .cast(VoteRequest::example(2, 3, "voter-001"), now())
            .await
            .unwrap();
        assert_eq!(ledger.vote_count().await, 2);
    }

    #[backend_test]
    async fn closed_window_rejects_votes(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let start = now();
        let end = start + Duration::hours(1);
        let contest = ContestCore::example(ContestStatus::Active, start, end);
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, contest).await;

        let cases = [
            (start - Duration::seconds(1), VotingClosed::NotStarted),
            (end + Duration::seconds(1), VotingClosed::Ended),
        ];
        for (at, reason) in cases {
            let result = ledger
                .cast(VoteRequest::example(1, 1, "voter-001"), at)
                .await;
            match result {
                Err(Error::VotingClosed(r)) => assert_eq!(r, reason),
                other => panic!("Expected {reason:?}, got {other:?}"),
            }
        }

        // Both ends of the window are inclusive.
        for (at, voter) in [(start, "voter-002"), (end, "voter-003")] {
            ledger
                .cast(VoteRequest::example(1, 1, voter), at)
                .await
                .unwrap();
        }
        assert_eq!(ledger.vote_count().await, 2);
    }

    #[backend_test]
    async fn inactive_contest_rejects_votes(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let draft = ContestCore::draft_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, draft).await;

        let result = ledger
            .cast(VoteRequest::example(1, 1, "voter-001"), now())
            .await;
        assert!(matches!(
            result,
            Err(Error::VotingClosed(VotingClosed::NotActive))
        ));
        assert_eq!(ledger.vote_count().await, 0);
    }

    #[backend_test]
    async fn unknown_contest_or_contestant(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        // No such contest, no such contestant, and a contestant from another contest.
        for (contest_id, contestant_id) in [(99, 1), (1, 99), (1, 3)] {
            let request = VoteRequest::example(contest_id, contestant_id, "voter-001");
            let result = ledger.cast(request, now()).await;
            assert!(
                matches!(result, Err(Error::NotFound(_))),
                "{contest_id}/{contestant_id}: {result:?}"
            );
        }
        assert_eq!(ledger.vote_count().await, 0);
    }

    #[backend_test]
    async fn invalid_request_is_rejected_first(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        // Contest 99 doesn't exist, but the short identifier is caught first.
        let result = ledger.cast(VoteRequest::example(99, 1, "abc"), now()).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[backend_test]
    async fn concurrent_votes_by_one_voter(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        let attempts = (0..8).map(|i| {
            let request = VoteRequest::example(1, 1 + i % 2, "voter-001");
            ledger.cast(request, now())
        });
        let results = join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for result in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(result, Err(Error::Conflict(_))), "{result:?}");
        }
        assert_eq!(ledger.vote_count().await, 1);
    }

    #[backend_test]
    async fn concurrent_votes_by_many_voters(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        // All of these touch the same contestant, so most will be retried.
        let voters: Vec<_> = (0..12).map(|i| format!("voter-{i:03}")).collect();
        let attempts = voters
            .iter()
            .map(|voter| ledger.cast(VoteRequest::example(1, 1, voter), now()));
        for result in join_all(attempts).await {
            result.unwrap();
        }
        assert_eq!(ledger.vote_count().await, 12);
    }

    #[backend_test]
    async fn stored_hashes_are_distinct(
        client: Client,
        contests: Coll<Contest>,
        contestants: Coll<Contestant>,
        votes: Coll<Vote>,
        counters: Coll<Counter>,
    ) {
        let open = ContestCore::open_example();
        let ledger = Ledger::new(&client, contests, contestants, votes, counters, open).await;

        // Several voters in both contests, all at the same instant.
        let at = now();
        for i in 0..10 {
            let voter = format!("voter-{i:03}");
            for (contest_id, contestant_id) in [(1, 1 + i % 2), (2, 3)] {
                ledger
                    .cast(VoteRequest::example(contest_id, contestant_id, &voter), at)
                    .await
                    .unwrap();
            }
        }

        let stored: Vec<Vote> = ledger
            .votes
            .find(None, None)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(stored.len(), 20);
        let hashes: HashSet<_> = stored.iter().map(|vote| &vote.vote_hash).collect();
        assert_eq!(hashes.len(), 20);
        for vote in &stored {
            let expected = VoteHash::new(
                vote.contest_id,
                vote.contestant_id,
                &vote.voter_identifier,
                vote.timestamp,
            );
            assert_eq!(vote.vote_hash, expected);
        }
    }
}
