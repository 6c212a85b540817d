//! Distinct-value aggregation, one concurrent store lookup per requested field.

use bson::Bson;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::errors::{QueryError, StoreError};
use crate::query::{DistinctRequest, FieldSpec, Filter};
use crate::store::QueryExecutor;

/// Field → distinct values, iterated and serialized in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistinctMap {
    entries: Vec<(String, Vec<Bson>)>,
}

impl DistinctMap {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[Bson]> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for DistinctMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub struct DistinctAggregator {
    executor: Arc<dyn QueryExecutor>,
}

impl DistinctAggregator {
    #[must_use]
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Runs every lookup concurrently and joins them back in request order.
    ///
    /// # Errors
    /// The first lookup to fail aborts the others and is returned as
    /// [`QueryError::AggregationFailure`].
    pub async fn aggregate(
        &self,
        request: &DistinctRequest,
        filter: Arc<Filter>,
    ) -> Result<DistinctMap, QueryError> {
        let specs = request.specs();
        let mut set = JoinSet::new();
        for (idx, spec) in specs.iter().cloned().enumerate() {
            let executor = Arc::clone(&self.executor);
            let filter = Arc::clone(&filter);
            set.spawn_blocking(move || {
                let res = lookup(executor.as_ref(), &spec, &filter).map_err(|source| {
                    QueryError::AggregationFailure { field: spec.response_key().to_string(), source }
                });
                (idx, res)
            });
        }

        let mut slots: Vec<Option<Vec<Bson>>> = vec![None; specs.len()];
        while let Some(joined) = set.join_next().await {
            let outcome = joined.map_err(QueryError::from).and_then(|(idx, res)| res.map(|v| (idx, v)));
            match outcome {
                Ok((idx, values)) => slots[idx] = Some(values),
                Err(e) => {
                    set.abort_all();
                    return Err(e);
                }
            }
        }

        let entries = specs
            .iter()
            .zip(slots)
            .map(|(spec, values)| (spec.response_key().to_string(), values.unwrap_or_default()))
            .collect();
        Ok(DistinctMap { entries })
    }
}

/// One distinct lookup. Schema-key discovery reads the `fields` sub-documents and
/// returns the union of their keys in ascending order.
///
/// # Errors
/// Propagates the store's error.
pub fn lookup(
    executor: &dyn QueryExecutor,
    spec: &FieldSpec,
    filter: &Filter,
) -> Result<Vec<Bson>, StoreError> {
    let values = executor.distinct(&spec.store_path(), filter)?;
    match spec {
        FieldSpec::Field(_) => Ok(values),
        FieldSpec::SchemaKeys => {
            let mut keys = BTreeSet::new();
            for v in &values {
                if let Bson::Document(sub) = v {
                    keys.extend(sub.keys().cloned());
                }
            }
            Ok(keys.into_iter().map(Bson::String).collect())
        }
    }
}
