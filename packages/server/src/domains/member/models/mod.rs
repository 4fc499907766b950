pub mod member;
pub mod token;

pub use member::{InsertOutcome, Member, NewMember, StudentId};
pub use token::generate_confirmation_token;
