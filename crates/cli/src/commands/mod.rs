//! Subcommand implementations.

pub mod admin;
pub mod orders;
pub mod seed;
pub mod stats;
