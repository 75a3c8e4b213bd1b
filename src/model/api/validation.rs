use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Permitted length of a contest name.
pub const CONTEST_NAME_LENGTH: RangeInclusive<usize> = 3..=200;
/// Permitted length of a contestant name.
pub const CONTESTANT_NAME_LENGTH: RangeInclusive<usize> = 2..=200;
/// Permitted length of a voter identifier.
pub const VOTER_IDENTIFIER_LENGTH: RangeInclusive<usize> = 5..=200;
/// Permitted length of a vote method tag.
pub const VOTE_METHOD_LENGTH: RangeInclusive<usize> = 1..=20;

/// Check that `value` has a length (in characters) within `range`.
pub fn check_length(field: &str, value: &str, range: RangeInclusive<usize>) -> Result<()> {
    let length = value.chars().count();
    if range.contains(&length) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "`{field}` must be between {} and {} characters long, got {length}",
            range.start(),
            range.end()
        )))
    }
}

/// Check that a contest's window does not end before it starts.
pub fn check_dates(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<()> {
    if start_date <= end_date {
        Ok(())
    } else {
        Err(Error::validation(
            "`start_date` must not be after `end_date`",
        ))
    }
}
