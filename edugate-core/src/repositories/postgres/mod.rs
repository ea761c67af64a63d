// src/repositories/postgres/mod.rs

use edugate_common::error::{ConflictCause, Error};

pub mod accounts;
pub mod catalog;
pub mod code_pools;
pub mod redemption;

pub use accounts::PostgresAccountRepository;
pub use catalog::PostgresCatalogRepository;
pub use code_pools::PostgresCodePoolRepository;
pub use redemption::{PostgresRedemptionStore, PostgresRedemptionUnit};

const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Translates constraint and concurrency failures raised by a write into
/// their domain meaning. Anything else stays a plain database error.
pub(crate) fn map_write_error(e: sqlx::Error) -> Error {
    if let Some(db) = e.as_database_error() {
        let code = db.code();
        match code.as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                return Error::Conflict(ConflictCause::WriteConflict);
            }
            Some(UNIQUE_VIOLATION) => match db.constraint() {
                Some("student_redemptions_student_pool_key") => {
                    return Error::DuplicateRedemptionInPool;
                }
                Some("student_redemptions_code_key") => return Error::CodeAlreadyUsed,
                Some("codes_pkey") => return Error::Conflict(ConflictCause::CodeCollision),
                _ => {}
            },
            _ => {}
        }
    }
    Error::Database(e)
}
