use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use std::fmt;
use typed_builder::TypedBuilder;

use crate::domains::member::types::ConfirmOutcome;

/// Student identification number (900xxxxxx)
pub type StudentId = i64;

/// Member model - SQL persistence layer
///
/// `confirmation_token` and `token_issued_at` are always set or cleared together.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub student_id: StudentId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub registered_at: DateTime<Utc>,
    pub confirmation_token: Option<String>,
    pub token_issued_at: Option<DateTime<Utc>>,
    pub is_confirmed: bool,
}

/// Required fields for a fresh registration.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewMember {
    pub student_id: StudentId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Result of an insert against the unique `student_id` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Member),
    /// Another registration for the same student_id already committed.
    Conflict,
}

impl Member {
    /// Build an unconfirmed member with no token issued yet.
    pub fn new_unconfirmed(new_member: NewMember, registered_at: DateTime<Utc>) -> Self {
        Self {
            student_id: new_member.student_id,
            email: new_member.email,
            first_name: new_member.first_name,
            last_name: new_member.last_name,
            registered_at,
            confirmation_token: None,
            token_issued_at: None,
            is_confirmed: false,
        }
    }

    /// Replace the current token. The previous one can no longer confirm.
    pub fn issue_token(&mut self, token: String, issued_at: DateTime<Utc>) {
        self.confirmation_token = Some(token);
        self.token_issued_at = Some(issued_at);
    }

    pub fn mark_confirmed(&mut self) {
        self.is_confirmed = true;
    }

    /// When the current token stops being accepted.
    ///
    /// `None` if no token was issued, or if the window runs past the
    /// representable range, in which case the token never expires.
    pub fn token_expiry_time(&self, expiry_hours: i64) -> Option<DateTime<Utc>> {
        self.token_issued_at
            .and_then(|issued_at| window_end(issued_at, expiry_hours))
    }

    /// Expiry is inclusive: a token checked exactly at its expiry time is expired.
    pub fn has_token_expired_at(&self, expiry_hours: i64, now: DateTime<Utc>) -> bool {
        match self.token_expiry_time(expiry_hours) {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Whether an unconfirmed record is old enough to be pruned.
    ///
    /// Members whose email never went out are aged from their registration time.
    pub fn is_stale_at(&self, expiry_hours: i64, now: DateTime<Utc>) -> bool {
        if self.is_confirmed {
            return false;
        }
        let reference = self.token_issued_at.unwrap_or(self.registered_at);
        match window_end(reference, expiry_hours) {
            Some(ends_at) => now >= ends_at,
            None => false,
        }
    }

    /// Evaluate a confirmation attempt without mutating anything.
    ///
    /// The checks run in a fixed order: confirmed, token missing, expired, match.
    pub fn check_confirmation(
        &self,
        supplied_token: &str,
        expiry_hours: i64,
        now: DateTime<Utc>,
    ) -> ConfirmOutcome {
        if self.is_confirmed {
            return ConfirmOutcome::AlreadyConfirmed;
        }

        let Some(token) = self.confirmation_token.as_deref() else {
            return ConfirmOutcome::NotSent;
        };

        if self.has_token_expired_at(expiry_hours, now) {
            return ConfirmOutcome::Expired;
        }

        if token == supplied_token {
            ConfirmOutcome::Confirmed
        } else {
            ConfirmOutcome::InvalidToken
        }
    }
}

fn window_end(start: DateTime<Utc>, hours: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_hours(hours).and_then(|window| start.checked_add_signed(window))
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_confirmed {
            "Confirmed"
        } else {
            "Not Confirmed"
        };
        write!(f, "<Member {}, {}, {}>", self.student_id, self.first_name, status)
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Member {
    /// Find member by student ID
    pub async fn find_by_id(student_id: StudentId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE student_id = $1")
            .bind(student_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find all members still waiting on confirmation
    pub async fn find_unconfirmed(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM members WHERE is_confirmed = false ORDER BY registered_at ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert new member, relying on the primary key to reject duplicates
    pub async fn insert(&self, pool: &PgPool) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, Self>(
            "INSERT INTO members (
                student_id,
                email,
                first_name,
                last_name,
                registered_at,
                confirmation_token,
                token_issued_at,
                is_confirmed
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (student_id) DO NOTHING
             RETURNING *",
        )
        .bind(self.student_id)
        .bind(&self.email)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(self.registered_at)
        .bind(&self.confirmation_token)
        .bind(self.token_issued_at)
        .bind(self.is_confirmed)
        .fetch_optional(pool)
        .await?;

        Ok(match inserted {
            Some(member) => InsertOutcome::Inserted(member),
            None => InsertOutcome::Conflict,
        })
    }

    /// Persist mutable fields. A confirmed row is never flipped back.
    pub async fn update(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE members
             SET email = $2,
                 first_name = $3,
                 last_name = $4,
                 confirmation_token = $5,
                 token_issued_at = $6,
                 is_confirmed = members.is_confirmed OR $7
             WHERE student_id = $1
             RETURNING *",
        )
        .bind(self.student_id)
        .bind(&self.email)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.confirmation_token)
        .bind(self.token_issued_at)
        .bind(self.is_confirmed)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("member {} not found for update", self.student_id))
    }

    /// Delete a batch of unconfirmed members in one statement. Confirmed rows are kept.
    pub async fn delete_many(student_ids: &[StudentId], pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM members WHERE student_id = ANY($1) AND is_confirmed = false",
        )
        .bind(student_ids.to_vec())
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
