use thiserror::Error;

use crate::domains::member::models::StudentId;

/// Errors surfaced by the membership registry
///
/// Confirmation failures and email failures are not errors; see
/// `ConfirmOutcome` and `NotificationStatus`.
#[derive(Error, Debug)]
pub enum MembershipError {
    #[error("Member {0} not found")]
    NotFound(StudentId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
