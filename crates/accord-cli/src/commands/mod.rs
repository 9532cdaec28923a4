//! CLI subcommands

pub mod common;
pub mod negotiate;
pub mod query;
pub mod sign;
