//! Commands module - CLI command implementations.

pub mod seed;
pub mod serve;
