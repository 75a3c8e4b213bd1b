//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR};

pub const DUPLICATE_KEY: i32 = 11000;

/// Extract the server error code and message, if the error carries one.
fn code_and_message(err: &DbError) -> Option<(i32, &str)> {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => Some((e.code, &e.message)),
        ErrorKind::Command(ref e) => Some((e.code, &e.message)),
        _ => None,
    }
}

/// Return true if the given error is a duplicate key error raised by the
/// named unique index.
pub fn is_duplicate_key_error(err: &DbError, index: &str) -> bool {
    match code_and_message(err) {
        Some((code, message)) => {
            code == DUPLICATE_KEY && message.contains(&format!("index: {index} "))
        }
        None => false,
    }
}

/// Return true if the transaction that raised the given error can be run
/// again from the start, e.g. after losing a write conflict.
pub fn is_transient(err: &DbError) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}
