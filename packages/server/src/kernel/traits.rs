// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The confirmation state machine lives in the member domain and uses these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMemberStore, BaseEmailService)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domains::member::models::{InsertOutcome, Member, StudentId};

// =============================================================================
// Member Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseMemberStore: Send + Sync {
    /// Fetch a member by student ID
    async fn get(&self, student_id: StudentId) -> Result<Option<Member>>;

    /// Insert a new member; must report `Conflict` if the student ID is taken
    async fn insert(&self, member: &Member) -> Result<InsertOutcome>;

    /// Persist mutable fields of an existing member
    async fn update(&self, member: &Member) -> Result<Member>;

    /// Delete members in one batch, returning how many were removed
    async fn delete(&self, student_ids: &[StudentId]) -> Result<u64>;

    /// All members with is_confirmed = false
    async fn find_unconfirmed(&self) -> Result<Vec<Member>>;
}

// =============================================================================
// Email Trait (Infrastructure - notifications)
// =============================================================================

#[async_trait]
pub trait BaseEmailService: Send + Sync {
    /// Send an HTML email
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()>;
}

// =============================================================================
// Clock Trait (Infrastructure - time source)
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
