use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{contest::Contest, contestant::Contestant, vote::Vote};

use super::counter::Counter;

/// Name of the unique index allowing one vote per voter per contest.
pub const CONTEST_VOTER_INDEX: &str = "contest_voter";
/// Name of the unique index on vote receipts.
pub const VOTE_HASH_INDEX: &str = "vote_hash";

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        req.guard::<&State<Database>>()
            .await
            .map(|db| Coll::from_db(db))
    }
}

// Contest collection
const CONTESTS: &str = "contests";
impl MongoCollection for Contest {
    const NAME: &'static str = CONTESTS;
}

// Contestant collection
const CONTESTANTS: &str = "contestants";
impl MongoCollection for Contestant {
    const NAME: &'static str = CONTESTANTS;
}

// Vote collection
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This also creates the collections themselves, which must exist before
/// they can be written to inside a transaction.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Contestant collection.
    let contestant_contest_index = IndexModel::builder()
        .keys(doc! {"contest_id": 1})
        .build();
    Coll::<Contestant>::from_db(db)
        .create_index(contestant_contest_index, None)
        .await?;

    // Vote collection.
    let contest_voter_index = IndexModel::builder()
        .keys(doc! {"contest_id": 1, "voter_identifier": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(CONTEST_VOTER_INDEX.to_string())
                .build(),
        )
        .build();
    let vote_hash_index = IndexModel::builder()
        .keys(doc! {"vote_hash": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(VOTE_HASH_INDEX.to_string())
                .build(),
        )
        .build();
    let vote_contestant_index = IndexModel::builder()
        .keys(doc! {"contestant_id": 1})
        .build();
    Coll::<Vote>::from_db(db)
        .create_indexes(
            [contest_voter_index, vote_hash_index, vote_contestant_index],
            None,
        )
        .await?;

    // Contest collection has no secondary indexes, but must still exist.
    let contest_names = db.list_collection_names(doc! {"name": CONTESTS}).await?;
    if contest_names.is_empty() {
        db.create_collection(CONTESTS, None).await?;
    }

    Ok(())
}
