//! Test fixtures for creating test data.

use chrono::{DateTime, TimeZone, Utc};
use club_core::domains::member::{Member, NewMember, StudentId};

/// Fixed registration time used across integration tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 3, 17, 0, 0).unwrap()
}

pub fn new_member(student_id: StudentId) -> NewMember {
    NewMember::builder()
        .student_id(student_id)
        .email(format!("{}@my.vcccd.edu", student_id))
        .first_name("Test")
        .last_name("Student")
        .build()
}

/// Unconfirmed member registered at `t0()` with no token
pub fn unconfirmed_member(student_id: StudentId) -> Member {
    Member::new_unconfirmed(new_member(student_id), t0())
}
