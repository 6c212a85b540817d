#![allow(dead_code)]

use bson::{Bson, doc};
use seriesquery::errors::StoreError;
use seriesquery::query::{Filter, StoreLimit};
use seriesquery::store::{FindOutcome, MemoryStore, QueryExecutor};
use std::sync::Arc;

/// Three series: two with attributes in Recife, one in Natal, one with points only.
pub fn series_store() -> Arc<MemoryStore> {
    let s = MemoryStore::new();
    s.insert(doc! {
        "_id": "abc123",
        "fields": {"city": "Recife", "sexo": "Feminino", "age": "20-29"},
        "points": {"1577836800": 12.0, "1577923200": 15.0},
    })
    .unwrap();
    s.insert(doc! {
        "_id": "def456",
        "fields": {"city": "Recife", "sexo": "Masculino"},
        "points": {"1577836800": 3.0},
    })
    .unwrap();
    s.insert(doc! {
        "_id": "ghi789",
        "fields": {"city": "Natal", "estado": "RN"},
    })
    .unwrap();
    s.insert(doc! {"_id": "jkl000", "points": {"1577836800": 1.0}}).unwrap();
    Arc::new(s)
}

/// Delegates to a real store but fails the operations it is told to fail.
pub struct FailingExecutor {
    pub inner: Arc<MemoryStore>,
    pub fail_count: bool,
    pub fail_find: bool,
    pub fail_distinct_on: Option<String>,
}

impl FailingExecutor {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self { inner, fail_count: false, fail_find: false, fail_distinct_on: None }
    }
}

impl QueryExecutor for FailingExecutor {
    fn find(&self, filter: &Filter, limit: StoreLimit) -> Result<FindOutcome, StoreError> {
        if self.fail_find {
            return Err(StoreError::Connect("find refused".into()));
        }
        self.inner.find(filter, limit)
    }

    fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        if self.fail_count {
            return Err(StoreError::Connect("count refused".into()));
        }
        self.inner.count(filter)
    }

    fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Bson>, StoreError> {
        if self.fail_distinct_on.as_deref() == Some(field) {
            return Err(StoreError::Io(format!("distinct on {field} refused")));
        }
        self.inner.distinct(field, filter)
    }
}
