//! Shared utilities for keepawaked
//!
//! This crate provides:
//! - The `InhibitorName` key used to deduplicate inhibitions
//! - Default paths for the configuration file

mod ids;
mod paths;

pub use ids::*;
pub use paths::*;
