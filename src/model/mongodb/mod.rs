mod bson;
mod collection;
mod counter;
mod errors;
mod transaction;

pub use bson::u32_id_filter;
pub use collection::{
    ensure_indexes_exist, Coll, MongoCollection, CONTEST_VOTER_INDEX, VOTE_HASH_INDEX,
};
pub use counter::{
    ensure_counters_exist, Counter, CONTESTANT_ID_COUNTER, CONTEST_ID_COUNTER, VOTE_ID_COUNTER,
};
pub use errors::{is_duplicate_key_error, is_transient};
pub use transaction::{retry_transient, touch};
