//! Membership registry - member lifecycle and confirmation state transitions
//!
//! Every state change is persisted before any email is attempted, so a failed
//! send never rolls back a committed record.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domains::member::email::{confirmation_html, confirmation_link, CONFIRMATION_SUBJECT};
use crate::domains::member::errors::MembershipError;
use crate::domains::member::models::{
    generate_confirmation_token, InsertOutcome, Member, NewMember, StudentId,
};
use crate::domains::member::types::{ConfirmOutcome, NotificationStatus, Registration, Resend};
use crate::kernel::ServerDeps;

/// Default confirmation window, in hours
pub const DEFAULT_EXPIRY_HOURS: i64 = 48;

/// Registry settings that are not dependencies
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Public origin used to build confirmation links
    pub base_url: Url,
    pub expiry_hours: i64,
}

impl RegistryConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            expiry_hours: DEFAULT_EXPIRY_HOURS,
        }
    }

    pub fn with_expiry_hours(mut self, expiry_hours: i64) -> Self {
        self.expiry_hours = expiry_hours;
        self
    }
}

pub struct MembershipRegistry {
    deps: ServerDeps,
    config: RegistryConfig,
}

impl MembershipRegistry {
    pub fn new(deps: ServerDeps, config: RegistryConfig) -> Self {
        Self { deps, config }
    }

    fn now(&self) -> DateTime<Utc> {
        self.deps.clock.now()
    }

    pub async fn get(&self, student_id: StudentId) -> Result<Option<Member>, MembershipError> {
        Ok(self.deps.member_store.get(student_id).await?)
    }

    /// Register a new member or return the existing one.
    ///
    /// Existing members are returned unchanged and receive no email, whatever
    /// details were supplied. A new member is validated, persisted, issued a
    /// token, and sent a confirmation link.
    pub async fn register_or_fetch(
        &self,
        new_member: NewMember,
    ) -> Result<Registration, MembershipError> {
        let student_id = new_member.student_id;

        if let Some(existing) = self.deps.member_store.get(student_id).await? {
            debug!("Member already exists, returning existing: {}", existing);
            return Ok(Registration::existing(existing));
        }

        validate(&new_member)?;

        let member = Member::new_unconfirmed(new_member, self.now());
        let mut member = match self.deps.member_store.insert(&member).await? {
            InsertOutcome::Inserted(member) => member,
            InsertOutcome::Conflict => {
                // Lost a race with a concurrent registration; the winner sends the email
                warn!(student_id, "Concurrent registration detected, re-fetching");
                let winner = self
                    .deps
                    .member_store
                    .get(student_id)
                    .await?
                    .ok_or(MembershipError::NotFound(student_id))?;
                return Ok(Registration::existing(winner));
            }
        };

        let token = self.generate_confirmation_token(&mut member).await?;
        let notification = self.send_confirmation(&member, &token).await;

        info!(
            student_id,
            notification = ?notification,
            "Member registered"
        );

        Ok(Registration {
            member,
            created: true,
            notification,
        })
    }

    /// Issue a fresh token and persist it, invalidating any earlier token.
    pub async fn generate_confirmation_token(
        &self,
        member: &mut Member,
    ) -> Result<String, MembershipError> {
        let token = generate_confirmation_token();
        member.issue_token(token.clone(), self.now());
        *member = self.deps.member_store.update(member).await?;

        debug!(student_id = member.student_id, "Confirmation token issued");
        Ok(token)
    }

    /// Confirm using the configured expiry window
    pub async fn confirm(
        &self,
        member: &mut Member,
        supplied_token: &str,
    ) -> Result<ConfirmOutcome, MembershipError> {
        self.confirm_with_expiry(member, supplied_token, self.config.expiry_hours)
            .await
    }

    /// Run the confirmation state machine and persist a successful confirmation.
    pub async fn confirm_with_expiry(
        &self,
        member: &mut Member,
        supplied_token: &str,
        expiry_hours: i64,
    ) -> Result<ConfirmOutcome, MembershipError> {
        let outcome = member.check_confirmation(supplied_token, expiry_hours, self.now());

        match outcome {
            ConfirmOutcome::Confirmed => {
                member.mark_confirmed();
                *member = self.deps.member_store.update(member).await?;
                info!(student_id = member.student_id, "Membership confirmed");
            }
            ConfirmOutcome::AlreadyConfirmed => {
                debug!(student_id = member.student_id, "Membership already confirmed");
            }
            ConfirmOutcome::NotSent | ConfirmOutcome::Expired | ConfirmOutcome::InvalidToken => {
                warn!(
                    student_id = member.student_id,
                    outcome = ?outcome,
                    "Confirmation rejected"
                );
            }
        }

        Ok(outcome)
    }

    /// Look the member up and confirm with the configured window
    pub async fn confirm_by_id(
        &self,
        student_id: StudentId,
        supplied_token: &str,
    ) -> Result<ConfirmOutcome, MembershipError> {
        let mut member = self
            .get(student_id)
            .await?
            .ok_or(MembershipError::NotFound(student_id))?;

        self.confirm(&mut member, supplied_token).await
    }

    pub fn token_expiry_time(&self, member: &Member, expiry_hours: i64) -> Option<DateTime<Utc>> {
        member.token_expiry_time(expiry_hours)
    }

    pub fn has_token_expired(&self, member: &Member, expiry_hours: i64) -> bool {
        member.has_token_expired_at(expiry_hours, self.now())
    }

    /// Prune with the configured expiry window
    pub async fn prune_expired(&self) -> Result<u64, MembershipError> {
        self.prune_expired_with_expiry(self.config.expiry_hours).await
    }

    /// Delete unconfirmed members whose window has run out, in one batch.
    pub async fn prune_expired_with_expiry(
        &self,
        expiry_hours: i64,
    ) -> Result<u64, MembershipError> {
        let now = self.now();
        let stale: Vec<StudentId> = self
            .deps
            .member_store
            .find_unconfirmed()
            .await?
            .into_iter()
            .filter(|member| member.is_stale_at(expiry_hours, now))
            .map(|member| member.student_id)
            .collect();

        if stale.is_empty() {
            debug!("No expired registrations to prune");
            return Ok(0);
        }

        let deleted = self.deps.member_store.delete(&stale).await?;
        info!(deleted, expiry_hours, "Pruned expired registrations");
        Ok(deleted)
    }

    /// Issue a new token and resend the confirmation email.
    pub async fn resend_confirmation(
        &self,
        student_id: StudentId,
    ) -> Result<Resend, MembershipError> {
        let mut member = self
            .get(student_id)
            .await?
            .ok_or(MembershipError::NotFound(student_id))?;

        if member.is_confirmed {
            debug!(student_id, "Resend skipped, already confirmed");
            return Ok(Resend::AlreadyConfirmed);
        }

        let token = self.generate_confirmation_token(&mut member).await?;
        let notification = self.send_confirmation(&member, &token).await;

        info!(student_id, notification = ?notification, "Confirmation resent");
        Ok(Resend::Reissued { notification })
    }

    async fn send_confirmation(&self, member: &Member, token: &str) -> NotificationStatus {
        let link = confirmation_link(&self.config.base_url, member.student_id, token);
        let body = confirmation_html(&link);

        match self
            .deps
            .email
            .send(&member.email, CONFIRMATION_SUBJECT, &body)
            .await
        {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                error!(
                    student_id = member.student_id,
                    error = %e,
                    "Failed to send confirmation email"
                );
                NotificationStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Column limits of the `members` table
const MAX_EMAIL_LEN: usize = 128;
const MAX_NAME_LEN: usize = 64;

fn validate(new_member: &NewMember) -> Result<(), MembershipError> {
    if new_member.student_id <= 0 {
        return Err(MembershipError::InvalidRequest(
            "student_id must be positive".to_string(),
        ));
    }
    if !new_member.email.contains('@') {
        return Err(MembershipError::InvalidRequest(
            "email must be a valid address".to_string(),
        ));
    }
    if new_member.first_name.trim().is_empty() || new_member.last_name.trim().is_empty() {
        return Err(MembershipError::InvalidRequest(
            "first_name and last_name are required".to_string(),
        ));
    }
    if new_member.email.chars().count() > MAX_EMAIL_LEN {
        return Err(MembershipError::InvalidRequest(format!(
            "email must be at most {} characters",
            MAX_EMAIL_LEN
        )));
    }
    if new_member.first_name.chars().count() > MAX_NAME_LEN
        || new_member.last_name.chars().count() > MAX_NAME_LEN
    {
        return Err(MembershipError::InvalidRequest(format!(
            "first_name and last_name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}
