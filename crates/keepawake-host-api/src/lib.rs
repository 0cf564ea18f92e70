//! Host adapter trait interfaces for keepawaked
//!
//! This crate defines the capability-based interface between the
//! reconciliation core and platform-specific collaborators: something that
//! lists running workloads, and something that holds sleep inhibitions.
//! It contains no platform code itself.

mod handle;
mod mock;
mod traits;

pub use handle::*;
pub use mock::*;
pub use traits::*;
