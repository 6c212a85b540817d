use thiserror::Error;

/// Failures reported by a store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(String),

    #[error("Store connection failed: {0}")]
    Connect(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Everything that can turn a request into an error envelope.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Invalid len: {0} (len must be -1 or higher)")]
    InvalidLength(String),

    #[error("Distinct must be a string or an array of strings")]
    InvalidDistinctShape,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Distinct lookup failed for '{field}': {source}")]
    AggregationFailure {
        field: String,
        #[source]
        source: StoreError,
    },

    #[error("Task failure: {0}")]
    Task(String),
}

impl QueryError {
    /// Short stable name of the error kind, used in audit logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedQuery(_) => "malformed-query",
            Self::InvalidLength(_) => "invalid-length",
            Self::InvalidDistinctShape => "invalid-distinct-shape",
            Self::InvalidRequest(_) => "invalid-request",
            Self::Store(_) => "store-failure",
            Self::AggregationFailure { .. } => "aggregation-failure",
            Self::Task(_) => "task-failure",
        }
    }
}

impl From<tokio::task::JoinError> for QueryError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

/// Failures while assembling the process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: String, message: String },
}
