use bson::{Bson, oid::ObjectId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

use super::eval::{collect_distinct, matches_filter};
use super::{FindOutcome, QueryExecutor};
use crate::errors::StoreError;
use crate::query::{Filter, StoreLimit};
use crate::types::{Document, FIELDS_ROOT, IDENTITY_FIELD, POINTS_ROOT};

#[derive(Default)]
struct Inner {
    docs: Vec<Document>,
    by_id: HashMap<String, usize>,
}

/// In-process document store. Reads take a shared lock, writes an exclusive one.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects the store by loading an NDJSON seed file. Called once at startup.
    ///
    /// # Errors
    /// Returns [`StoreError::Connect`] if the file cannot be opened or parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| StoreError::Connect(format!("{}: {e}", path.display())))?;
        let store = Self::new();
        let report = super::load_ndjson(&store, file)
            .map_err(|e| StoreError::Connect(format!("{}: {e}", path.display())))?;
        log::info!("store loaded {} documents from {}", report.inserted, path.display());
        Ok(store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a document, replacing any document with the same `_id`.
    /// A missing `_id` gets a fresh `ObjectId`.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidDocument`] when `_id` is neither a string nor an `ObjectId`.
    pub fn insert(&self, mut doc: Document) -> Result<String, StoreError> {
        if !doc.contains_key(IDENTITY_FIELD) {
            doc.insert(IDENTITY_FIELD, ObjectId::new());
        }
        let id = id_string(&doc)?;
        let mut inner = self.inner.write();
        match inner.by_id.get(&id).copied() {
            Some(pos) => inner.docs[pos] = doc,
            None => {
                let pos = inner.docs.len();
                inner.docs.push(doc);
                inner.by_id.insert(id.clone(), pos);
            }
        }
        Ok(id)
    }

    /// Merges `fields` into the series' `fields` sub-document, creating the series if needed.
    pub fn upsert_fields(&self, uid: &str, fields: Document) {
        self.merge_into(uid, FIELDS_ROOT, fields);
    }

    /// Records one point under `points.<unix-seconds>`.
    pub fn add_point(&self, uid: &str, at: DateTime<Utc>, value: f64) {
        self.add_points(uid, [(at, value)]);
    }

    pub fn add_points<I>(&self, uid: &str, points: I)
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let mut prepared = Document::new();
        for (at, value) in points {
            prepared.insert(at.timestamp().to_string(), value);
        }
        self.merge_into(uid, POINTS_ROOT, prepared);
    }

    fn merge_into(&self, uid: &str, root: &str, entries: Document) {
        let mut inner = self.inner.write();
        let pos = match inner.by_id.get(uid).copied() {
            Some(pos) => pos,
            None => {
                let pos = inner.docs.len();
                let mut doc = Document::new();
                doc.insert(IDENTITY_FIELD, uid);
                inner.docs.push(doc);
                inner.by_id.insert(uid.to_string(), pos);
                pos
            }
        };
        let doc = &mut inner.docs[pos];
        if !matches!(doc.get(root), Some(Bson::Document(_))) {
            doc.insert(root, Document::new());
        }
        if let Some(Bson::Document(sub)) = doc.get_mut(root) {
            for (k, v) in entries {
                sub.insert(k, v);
            }
        }
    }
}

fn id_string(doc: &Document) -> Result<String, StoreError> {
    match doc.get(IDENTITY_FIELD) {
        Some(Bson::String(s)) => Ok(s.clone()),
        Some(Bson::ObjectId(oid)) => Ok(oid.to_hex()),
        Some(other) => Err(StoreError::InvalidDocument(format!("unsupported _id: {other}"))),
        None => Err(StoreError::InvalidDocument("missing _id".into())),
    }
}

impl QueryExecutor for MemoryStore {
    fn find(&self, filter: &Filter, limit: StoreLimit) -> Result<FindOutcome, StoreError> {
        log::debug!("find limited to {} (0 = none): {:?}", limit.as_raw(), filter.to_document());
        let inner = self.inner.read();
        let cap = limit.cap().unwrap_or(usize::MAX);
        let mut documents = Vec::new();
        let mut matched = 0u64;
        for d in inner.docs.iter().filter(|d| matches_filter(d, filter)) {
            if documents.len() < cap {
                documents.push(d.clone());
            }
            matched += 1;
        }
        Ok(FindOutcome { documents, matched_count: matched })
    }

    fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let inner = self.inner.read();
        Ok(inner.docs.iter().filter(|d| matches_filter(d, filter)).count() as u64)
    }

    fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Bson>, StoreError> {
        log::debug!("distinct {field}: {:?}", filter.to_document());
        let inner = self.inner.read();
        let mut out = Vec::new();
        for d in inner.docs.iter().filter(|d| matches_filter(d, filter)) {
            collect_distinct(d, field, &mut out);
        }
        Ok(out)
    }
}
