//! Translation of MongoDB driver errors into [`StoreError`].

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use tracing::debug;

use crate::domain::ports::StoreError;

/// Server error code for a cursor the server no longer knows about.
const CURSOR_NOT_FOUND: i32 = 43;

/// Server error code for a write rejected by a unique index.
const DUPLICATE_KEY: i32 = 11000;

/// Map a driver error onto the port's error kinds.
///
/// Reachability failures become [`StoreError::Connection`], conversion
/// failures [`StoreError::Serialization`]. Unique index violations from
/// commands, single writes or batch inserts become
/// [`StoreError::DuplicateKey`]; anything else the server rejected becomes
/// [`StoreError::Query`].
pub(crate) fn map_mongo_error(error: MongoError) -> StoreError {
    debug!(error = %error, labels = ?error.labels(), "mongodb operation failed");
    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::Authentication { .. }
        | ErrorKind::DnsResolve { .. } => StoreError::connection(error.to_string()),
        ErrorKind::Command(command) => map_command_error(command.code, &command.message),
        ErrorKind::Write(WriteFailure::WriteError(write)) => {
            map_command_error(write.code, &write.message)
        }
        ErrorKind::InsertMany(insert) => insert
            .write_errors
            .iter()
            .flatten()
            .find(|write| write.code == DUPLICATE_KEY)
            .map_or_else(
                || StoreError::query(error.to_string()),
                |write| StoreError::duplicate_key(write.message.clone()),
            ),
        ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
            StoreError::serialization(error.to_string())
        }
        _ => StoreError::query(error.to_string()),
    }
}

fn map_command_error(code: i32, message: &str) -> StoreError {
    match code {
        CURSOR_NOT_FOUND => StoreError::invalid_cursor(),
        DUPLICATE_KEY => StoreError::duplicate_key(message),
        _ => StoreError::query(format!("command failed with code {code}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn cursor_not_found_is_invalid_cursor() {
        assert_eq!(
            map_command_error(CURSOR_NOT_FOUND, "cursor id 7 not found"),
            StoreError::invalid_cursor()
        );
    }

    #[rstest]
    fn duplicate_key_code_is_its_own_kind() {
        let error = map_command_error(
            DUPLICATE_KEY,
            "E11000 duplicate key error collection: accounts.user index: email_1",
        );
        assert!(error.is_duplicate_key());
        assert!(error.to_string().contains("email_1"));
    }

    #[rstest]
    #[case(2, "bad value")]
    #[case(13, "not authorized")]
    fn other_command_codes_are_query_errors(#[case] code: i32, #[case] message: &str) {
        let error = map_command_error(code, message);
        assert!(matches!(error, StoreError::Query { .. }));
        assert!(error.to_string().contains(message));
    }
}
