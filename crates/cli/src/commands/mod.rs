//! Subcommand implementations.

pub mod hash;
pub mod superuser;
