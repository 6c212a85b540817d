use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::distinct::DistinctMap;
use crate::errors::QueryError;
use crate::types::Document;

/// What the find/count path produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultSet {
    /// Neither documents nor a count were requested.
    #[default]
    Nothing,
    /// Only the size of the matched set.
    Count(u64),
    /// A page of documents plus the size of the whole matched set.
    Page { documents: Vec<Document>, count: u64 },
}

impl ResultSet {
    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Nothing => None,
            Self::Count(n) | Self::Page { count: n, .. } => Some(*n),
        }
    }

    #[must_use]
    pub fn documents(&self) -> Option<&[Document]> {
        match self {
            Self::Page { documents, .. } => Some(documents),
            _ => None,
        }
    }
}

/// Outcome of one request, serialized as
/// `{ "success": bool, "content"?, "len"?, "distinct"?, "error"? }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Ok { result: ResultSet, distinct: Option<DistinctMap> },
    Err { message: String },
}

impl ResponseEnvelope {
    #[must_use]
    pub const fn ok(result: ResultSet, distinct: Option<DistinctMap>) -> Self {
        Self::Ok { result, distinct }
    }

    #[must_use]
    pub fn error(err: &QueryError) -> Self {
        Self::Err { message: err.to_string() }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    #[must_use]
    pub fn documents(&self) -> Option<&[Document]> {
        match self {
            Self::Ok { result, .. } => result.documents(),
            Self::Err { .. } => None,
        }
    }

    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Ok { result, .. } => result.count(),
            Self::Err { .. } => None,
        }
    }

    #[must_use]
    pub const fn distinct(&self) -> Option<&DistinctMap> {
        match self {
            Self::Ok { distinct, .. } => distinct.as_ref(),
            Self::Err { .. } => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { message } => Some(message),
        }
    }

    /// # Errors
    /// Returns an error if a document value cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<Result<ResponseEnvelope, QueryError>> for ResponseEnvelope {
    fn from(r: Result<ResponseEnvelope, QueryError>) -> Self {
        r.unwrap_or_else(|e| Self::error(&e))
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Ok { result, distinct } => {
                map.serialize_entry("success", &true)?;
                if let ResultSet::Page { documents, .. } = result {
                    map.serialize_entry("content", documents)?;
                }
                if let Some(n) = result.count() {
                    map.serialize_entry("len", &n)?;
                }
                if let Some(d) = distinct {
                    map.serialize_entry("distinct", d)?;
                }
            }
            Self::Err { message } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", message)?;
            }
        }
        map.end()
    }
}
