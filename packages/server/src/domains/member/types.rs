//! Member domain result types
//!
//! Simple, serializable outcomes returned by the registry.

use serde::Serialize;

use crate::domains::member::models::Member;

/// Result of a confirmation attempt.
///
/// Token problems are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmOutcome {
    AlreadyConfirmed,
    NotSent,
    Expired,
    Confirmed,
    InvalidToken,
}

impl ConfirmOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::AlreadyConfirmed | Self::Confirmed)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::AlreadyConfirmed => "Your membership has already been confirmed",
            Self::NotSent => "Your confirmation email has not been sent out, please wait",
            Self::Expired => "Confirmation link expired, please try again",
            Self::Confirmed => "Your membership has been confirmed",
            Self::InvalidToken => "Confirmation token invalid, please try again",
        }
    }
}

/// What happened to the confirmation email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    /// Nothing was sent (existing registration)
    Skipped,
    /// Send failed; the member record stays persisted
    Failed { reason: String },
}

/// Result of `register_or_fetch`
#[derive(Debug, Clone)]
pub struct Registration {
    pub member: Member,
    /// False when an existing record was returned
    pub created: bool,
    pub notification: NotificationStatus,
}

impl Registration {
    pub(crate) fn existing(member: Member) -> Self {
        Self {
            member,
            created: false,
            notification: NotificationStatus::Skipped,
        }
    }
}

/// Result of `resend_confirmation`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resend {
    AlreadyConfirmed,
    Reissued { notification: NotificationStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flags() {
        assert!(ConfirmOutcome::Confirmed.success());
        assert!(ConfirmOutcome::AlreadyConfirmed.success());
        assert!(!ConfirmOutcome::NotSent.success());
        assert!(!ConfirmOutcome::Expired.success());
        assert!(!ConfirmOutcome::InvalidToken.success());
    }

    #[test]
    fn test_notification_status_json() {
        let failed = NotificationStatus::Failed {
            reason: "timeout".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({"status": "failed", "reason": "timeout"})
        );
        assert_eq!(
            serde_json::to_value(NotificationStatus::Sent).unwrap(),
            serde_json::json!({"status": "sent"})
        );
    }
}
