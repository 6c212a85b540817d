//! Store collaborator contract, plus the in-process store used by the binary and tests.

pub mod eval;
mod memory;
mod ndjson;

use bson::Bson;

use crate::errors::StoreError;
use crate::query::{Filter, StoreLimit};
use crate::types::Document;

pub use memory::MemoryStore;
pub use ndjson::{LoadReport, load_ndjson};

/// Result of a limited find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOutcome {
    pub documents: Vec<Document>,
    /// Size of the whole matched set, regardless of the limit.
    pub matched_count: u64,
}

/// The only operations the query layer needs from a document store.
///
/// Implementations must be safe to share between concurrent requests; calls are
/// made from blocking worker threads.
pub trait QueryExecutor: Send + Sync {
    /// # Errors
    /// Returns a [`StoreError`] when the store cannot serve the read.
    fn find(&self, filter: &Filter, limit: StoreLimit) -> Result<FindOutcome, StoreError>;

    /// # Errors
    /// Returns a [`StoreError`] when the store cannot serve the read.
    fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// # Errors
    /// Returns a [`StoreError`] when the store cannot serve the read.
    fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Bson>, StoreError>;
}
