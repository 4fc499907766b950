// EP Club membership service - API Core
//
// Registers prospective members, emails them a confirmation link, confirms them
// within a time window, and prunes stale unconfirmed registrations.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
