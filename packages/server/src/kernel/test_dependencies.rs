// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{BaseClock, BaseEmailService, BaseMemberStore, ServerDeps};
use crate::domains::member::models::{InsertOutcome, Member, StudentId};

// =============================================================================
// In-memory Member Store
// =============================================================================

/// Member store backed by a map, with the same uniqueness and
/// never-unconfirm rules as the Postgres table.
pub struct InMemoryMemberStore {
    members: Mutex<BTreeMap<StudentId, Member>>,
    delete_calls: Mutex<Vec<Vec<StudentId>>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(BTreeMap::new()),
            delete_calls: Mutex::new(Vec::new()),
        }
    }

    /// Seed a member directly, bypassing the registry
    pub fn with_member(self, member: Member) -> Self {
        self.members
            .lock()
            .unwrap()
            .insert(member.student_id, member);
        self
    }

    pub fn snapshot(&self, student_id: StudentId) -> Option<Member> {
        self.members.lock().unwrap().get(&student_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.members.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every batch passed to `delete`
    pub fn delete_calls(&self) -> Vec<Vec<StudentId>> {
        self.delete_calls.lock().unwrap().clone()
    }
}

impl Default for InMemoryMemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMemberStore for InMemoryMemberStore {
    async fn get(&self, student_id: StudentId) -> Result<Option<Member>> {
        Ok(self.snapshot(student_id))
    }

    async fn insert(&self, member: &Member) -> Result<InsertOutcome> {
        let mut members = self.members.lock().unwrap();
        if members.contains_key(&member.student_id) {
            return Ok(InsertOutcome::Conflict);
        }
        members.insert(member.student_id, member.clone());
        Ok(InsertOutcome::Inserted(member.clone()))
    }

    async fn update(&self, member: &Member) -> Result<Member> {
        let mut members = self.members.lock().unwrap();
        let stored = members
            .get_mut(&member.student_id)
            .ok_or_else(|| anyhow::anyhow!("member {} not found for update", member.student_id))?;

        let was_confirmed = stored.is_confirmed;
        *stored = member.clone();
        stored.is_confirmed = was_confirmed || member.is_confirmed;
        Ok(stored.clone())
    }

    async fn delete(&self, student_ids: &[StudentId]) -> Result<u64> {
        self.delete_calls
            .lock()
            .unwrap()
            .push(student_ids.to_vec());

        let mut members = self.members.lock().unwrap();
        let deleted = student_ids
            .iter()
            .filter(|id| {
                let unconfirmed = members.get(*id).is_some_and(|member| !member.is_confirmed);
                unconfirmed && members.remove(*id).is_some()
            })
            .count();
        Ok(deleted as u64)
    }

    async fn find_unconfirmed(&self) -> Result<Vec<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .filter(|m| !m.is_confirmed)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Mock Email Service
// =============================================================================

/// A captured email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

pub struct MockEmailService {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    failure: Mutex<Option<String>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failure: Mutex::new(None),
        }
    }

    /// Make every send fail with the given reason
    pub fn failing(self, reason: &str) -> Self {
        self.set_failure(Some(reason));
        self
    }

    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.lock().unwrap() = reason.map(str::to_string);
    }

    /// Get all emails that were sent
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Token from the most recent email's confirmation link
    pub fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let body = &sent.last()?.html_body;
        let start = body.find("confirmation_token=")? + "confirmation_token=".len();
        let token: String = body[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        Some(token)
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailService for MockEmailService {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            anyhow::bail!(reason);
        }

        self.sent.lock().unwrap().push(SentEmail {
            to: to_email.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock Clock
// =============================================================================

/// Clock that only moves when told to
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl BaseClock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// TestDependencies bundle
// =============================================================================

/// Concrete mock handles plus the ServerDeps built from them
pub struct TestDependencies {
    pub member_store: Arc<InMemoryMemberStore>,
    pub email: Arc<MockEmailService>,
    pub clock: Arc<MockClock>,
}

impl TestDependencies {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            member_store: Arc::new(InMemoryMemberStore::new()),
            email: Arc::new(MockEmailService::new()),
            clock: Arc::new(MockClock::new(now)),
        }
    }

    pub fn with_email(mut self, email: MockEmailService) -> Self {
        self.email = Arc::new(email);
        self
    }

    pub fn with_store(mut self, store: InMemoryMemberStore) -> Self {
        self.member_store = Arc::new(store);
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.member_store.clone(),
            self.email.clone(),
            self.clock.clone(),
        )
    }
}
