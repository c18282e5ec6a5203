//! Command implementations

pub mod arn;
pub mod credentials;
pub mod whoami;
