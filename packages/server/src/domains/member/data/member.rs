use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::member::models::member::{Member as MemberModel, StudentId};

/// Member API data type
///
/// Public representation of a member. The confirmation token is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberData {
    pub student_id: StudentId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// When the member registered
    pub registered_at: DateTime<Utc>,

    /// When the current confirmation email was issued, if ever
    pub token_issued_at: Option<DateTime<Utc>>,

    pub is_confirmed: bool,
}

impl From<MemberModel> for MemberData {
    fn from(member: MemberModel) -> Self {
        Self {
            student_id: member.student_id,
            email: member.email,
            first_name: member.first_name,
            last_name: member.last_name,
            registered_at: member.registered_at,
            token_issued_at: member.token_issued_at,
            is_confirmed: member.is_confirmed,
        }
    }
}
