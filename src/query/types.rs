use std::collections::BTreeMap;

use crate::types::{Document, FIELDS_ROOT, FieldPath, IDENTITY_FIELD, UID_KEY};

/// Exact-match conditions keyed by dotted store path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: BTreeMap<FieldPath, String>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition for a caller-facing key. `uid` targets the identity field,
    /// anything else lands under `fields.`. A repeated key keeps the last value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.conditions.insert(store_path_for_key(key), value.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Value required at a store path, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.conditions.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Store-level filter document, `{ "<path>": "<value>", ... }`.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();
        for (k, v) in &self.conditions {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}

fn store_path_for_key(key: &str) -> FieldPath {
    if key == UID_KEY { IDENTITY_FIELD.to_string() } else { format!("{FIELDS_ROOT}.{key}") }
}

/// What the caller asked for in terms of result length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthIntent {
    Unbounded,
    CountOnly,
    Bounded(u64),
}

/// Limit argument in the store's own convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLimit {
    Unlimited,
    AtMost(u64),
}

impl StoreLimit {
    /// Raw store value, where `0` means "no limit".
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        match self {
            Self::Unlimited => 0,
            Self::AtMost(n) => n,
        }
    }

    /// Inverse of [`StoreLimit::as_raw`].
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        if raw == 0 { Self::Unlimited } else { Self::AtMost(raw) }
    }

    #[must_use]
    pub fn cap(self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::AtMost(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

/// One requested distinct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSpec {
    /// The reserved `fields` token: discover the keys present under `fields`.
    SchemaKeys,
    /// A user field, addressed as `fields.<name>` in the store.
    Field(String),
}

impl FieldSpec {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == FIELDS_ROOT { Self::SchemaKeys } else { Self::Field(raw.to_string()) }
    }

    /// Path handed to the store's distinct lookup.
    #[must_use]
    pub fn store_path(&self) -> FieldPath {
        match self {
            Self::SchemaKeys => FIELDS_ROOT.to_string(),
            Self::Field(name) => format!("{FIELDS_ROOT}.{name}"),
        }
    }

    /// Key used in the response map, without the internal namespace.
    #[must_use]
    pub fn response_key(&self) -> &str {
        match self {
            Self::SchemaKeys => FIELDS_ROOT,
            Self::Field(name) => name,
        }
    }
}

/// Ordered, duplicate-free list of distinct specifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctRequest {
    specs: Vec<FieldSpec>,
}

impl DistinctRequest {
    /// Keeps the first occurrence of each specifier.
    pub fn from_specifiers<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut specs: Vec<FieldSpec> = Vec::new();
        for r in raw {
            let spec = FieldSpec::parse(r.as_ref());
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
        Self { specs }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }
}

/// A fully validated request, ready for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub filter: Filter,
    pub length: LengthIntent,
    pub distinct: DistinctRequest,
}
