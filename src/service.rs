//! Per-request orchestration: validate, fetch and aggregate concurrently, build the envelope.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::distinct::{DistinctAggregator, DistinctMap};
use crate::errors::QueryError;
use crate::query::{Filter, LengthIntent, QueryRequest, RawRequest, StoreLimit};
use crate::response::{ResponseEnvelope, ResultSet};
use crate::store::QueryExecutor;

pub(crate) const AUDIT_TARGET: &str = "seriesquery::audit";

/// What an unbounded request with an empty filter returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyFilterPolicy {
    /// Report the collection size without dumping its documents.
    #[default]
    CountOnly,
    /// Return every document.
    ReturnAll,
    /// Return neither documents nor a count.
    Omit,
}

impl std::str::FromStr for EmptyFilterPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count-only" | "count" => Ok(Self::CountOnly),
            "return-all" | "all" => Ok(Self::ReturnAll),
            "omit" | "none" => Ok(Self::Omit),
            other => Err(format!("unknown empty-filter policy: {other}")),
        }
    }
}

/// Which store call the find/count path makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    Skip,
    Count,
    Find(StoreLimit),
}

pub struct QueryService {
    executor: Arc<dyn QueryExecutor>,
    aggregator: DistinctAggregator,
    empty_filter: EmptyFilterPolicy,
}

impl QueryService {
    #[must_use]
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            aggregator: DistinctAggregator::new(Arc::clone(&executor)),
            executor,
            empty_filter: EmptyFilterPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_empty_filter_policy(mut self, policy: EmptyFilterPolicy) -> Self {
        self.empty_filter = policy;
        self
    }

    #[must_use]
    pub const fn empty_filter_policy(&self) -> EmptyFilterPolicy {
        self.empty_filter
    }

    /// Validates and runs one inbound request. Never fails: errors become an error envelope.
    pub async fn handle(&self, raw: RawRequest) -> ResponseEnvelope {
        let started = Instant::now();
        let outcome = match QueryRequest::try_from(raw) {
            Ok(req) => {
                log::debug!("request {:?} len={} distinct={}", req.filter, req.length, req.distinct.len());
                self.execute(req).await
            }
            Err(e) => Err(e),
        };
        let elapsed_ms = started.elapsed().as_millis();
        match &outcome {
            Ok(env) => log::info!(
                target: AUDIT_TARGET,
                "outcome=ok len={:?} distinct={} elapsed_ms={elapsed_ms}",
                env.count(),
                env.distinct().map_or(0, DistinctMap::len)
            ),
            Err(e) => log::warn!(
                target: AUDIT_TARGET,
                "outcome=error kind={} message=\"{e}\" elapsed_ms={elapsed_ms}",
                e.kind()
            ),
        }
        ResponseEnvelope::from(outcome)
    }

    /// Runs a validated request. The find/count path and the distinct fan-out run
    /// concurrently; the first failure of either wins.
    ///
    /// # Errors
    /// Any store or aggregation failure.
    pub async fn execute(&self, request: QueryRequest) -> Result<ResponseEnvelope, QueryError> {
        let QueryRequest { filter, length, distinct } = request;
        let plan = self.plan(&filter, length);
        let filter = Arc::new(filter);

        let fetch = self.fetch(plan, Arc::clone(&filter));
        let aggregate = async {
            if distinct.is_empty() {
                Ok(None)
            } else {
                self.aggregator.aggregate(&distinct, Arc::clone(&filter)).await.map(Some)
            }
        };
        let (result, distinct) = tokio::try_join!(fetch, aggregate)?;
        Ok(ResponseEnvelope::ok(result, distinct))
    }

    /// Maps a length intent onto a store call.
    #[must_use]
    pub fn plan(&self, filter: &Filter, length: LengthIntent) -> FetchPlan {
        match (length, length.store_limit()) {
            (LengthIntent::CountOnly, _) | (_, None) => FetchPlan::Count,
            (LengthIntent::Unbounded, Some(limit)) if filter.is_empty() => match self.empty_filter {
                EmptyFilterPolicy::CountOnly => FetchPlan::Count,
                EmptyFilterPolicy::ReturnAll => FetchPlan::Find(limit),
                EmptyFilterPolicy::Omit => FetchPlan::Skip,
            },
            (_, Some(limit)) => FetchPlan::Find(limit),
        }
    }

    async fn fetch(&self, plan: FetchPlan, filter: Arc<Filter>) -> Result<ResultSet, QueryError> {
        let executor = Arc::clone(&self.executor);
        match plan {
            FetchPlan::Skip => Ok(ResultSet::Nothing),
            FetchPlan::Count => {
                let n = tokio::task::spawn_blocking(move || executor.count(&filter)).await??;
                Ok(ResultSet::Count(n))
            }
            FetchPlan::Find(limit) => {
                let out = tokio::task::spawn_blocking(move || executor.find(&filter, limit)).await??;
                Ok(ResultSet::Page { documents: out.documents, count: out.matched_count })
            }
        }
    }
}
