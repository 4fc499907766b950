//! Server dependencies (using traits for testability)
//!
//! This module provides the dependency container used by the membership registry.
//! All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sendgrid::SendGridService;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::domains::member::models::{InsertOutcome, Member, StudentId};
use crate::kernel::{BaseClock, BaseEmailService, BaseMemberStore};

// =============================================================================
// SendGridService Adapter (implements BaseEmailService trait)
// =============================================================================

/// Wrapper around SendGridService that implements BaseEmailService trait
pub struct SendGridAdapter(pub Arc<SendGridService>);

impl SendGridAdapter {
    pub fn new(service: Arc<SendGridService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseEmailService for SendGridAdapter {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        self.0
            .send_mail(to_email, subject, html_body)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// Console email (local development, no API key)
// =============================================================================

/// Logs emails instead of delivering them
pub struct ConsoleEmailService;

#[async_trait]
impl BaseEmailService for ConsoleEmailService {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        info!(to = to_email, subject, body = html_body, "Email (console delivery)");
        Ok(())
    }
}

// =============================================================================
// Postgres member store (implements BaseMemberStore trait)
// =============================================================================

/// Member store backed by the `members` table
#[derive(Clone)]
pub struct PostgresMemberStore {
    pool: PgPool,
}

impl PostgresMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseMemberStore for PostgresMemberStore {
    async fn get(&self, student_id: StudentId) -> Result<Option<Member>> {
        Member::find_by_id(student_id, &self.pool).await
    }

    async fn insert(&self, member: &Member) -> Result<InsertOutcome> {
        member.insert(&self.pool).await
    }

    async fn update(&self, member: &Member) -> Result<Member> {
        member.update(&self.pool).await
    }

    async fn delete(&self, student_ids: &[StudentId]) -> Result<u64> {
        Member::delete_many(student_ids, &self.pool).await
    }

    async fn find_unconfirmed(&self) -> Result<Vec<Member>> {
        Member::find_unconfirmed(&self.pool).await
    }
}

// =============================================================================
// System clock
// =============================================================================

pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies of the membership registry (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub member_store: Arc<dyn BaseMemberStore>,
    pub email: Arc<dyn BaseEmailService>,
    pub clock: Arc<dyn BaseClock>,
}

impl ServerDeps {
    pub fn new(
        member_store: Arc<dyn BaseMemberStore>,
        email: Arc<dyn BaseEmailService>,
        clock: Arc<dyn BaseClock>,
    ) -> Self {
        Self {
            member_store,
            email,
            clock,
        }
    }

    /// Production wiring: Postgres store, system clock, and SendGrid when a key is configured
    pub fn production(pool: PgPool, sendgrid: Option<Arc<SendGridService>>) -> Self {
        let email: Arc<dyn BaseEmailService> = match sendgrid {
            Some(service) => Arc::new(SendGridAdapter::new(service)),
            None => {
                tracing::warn!("SENDGRID_API_KEY not set, confirmation emails will only be logged");
                Arc::new(ConsoleEmailService)
            }
        };

        Self::new(
            Arc::new(PostgresMemberStore::new(pool)),
            email,
            Arc::new(SystemClock),
        )
    }
}
