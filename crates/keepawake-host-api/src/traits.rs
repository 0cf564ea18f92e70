//! Host adapter traits

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::InhibitorHandle;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Listing active workloads failed: {0}")]
    Observer(String),

    #[error("Workload name unavailable: {0}")]
    NameUnavailable(String),

    #[error("Inhibition call failed: {0}")]
    Inhibition(String),

    #[error("Inhibition rejected: {0}")]
    Rejected(String),

    #[error("Operation not supported by this adapter")]
    Unsupported,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// A running workload (a virtual machine) as reported by an observer
#[async_trait]
pub trait Workload: Send + Sync + fmt::Debug {
    /// Resolve the workload's name.
    ///
    /// May fail even though the workload was just listed, e.g. when it shut
    /// down in between.
    async fn name(&self) -> HostResult<String>;
}

/// Lists the workloads that are currently active
#[async_trait]
pub trait WorkloadObserver: Send + Sync {
    /// Snapshot of the active workloads. Names are not guaranteed unique.
    async fn list_active(&self) -> HostResult<Vec<Box<dyn Workload>>>;
}

/// Holds and releases sleep inhibitions
#[async_trait]
pub trait SleepInhibitor: Send + Sync {
    /// Inhibit sleep on behalf of `name`
    async fn inhibit(&self, name: &str) -> HostResult<InhibitorHandle>;

    /// Release the inhibition identified by `handle`
    async fn uninhibit(&self, handle: InhibitorHandle) -> HostResult<()>;

    /// Optional: names of the inhibitions the service currently holds.
    ///
    /// Only some power managers implement this. Used for verification, never
    /// for bookkeeping.
    async fn active_inhibitors(&self) -> HostResult<Vec<String>> {
        Err(HostError::Unsupported)
    }
}
