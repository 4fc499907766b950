//! Member domain - club sign-up and email confirmation
//!
//! Architecture:
//!   HTTP route → MembershipRegistry → BaseMemberStore / BaseEmailService

pub mod data;
pub mod email;
pub mod errors;
pub mod models;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use data::MemberData;
pub use errors::MembershipError;
pub use models::member::{InsertOutcome, Member, NewMember, StudentId};
pub use registry::{MembershipRegistry, RegistryConfig, DEFAULT_EXPIRY_HOURS};
pub use types::{ConfirmOutcome, NotificationStatus, Registration, Resend};
