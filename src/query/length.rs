use crate::errors::QueryError;

use super::types::{LengthIntent, StoreLimit};

/// Length directive used when the caller sends none.
pub const DEFAULT_LEN: i64 = -1;

impl LengthIntent {
    /// `-1` is unbounded, `0` is count-only, `n > 0` is bounded.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidLength`] when `len < -1`.
    pub fn from_len(len: i64) -> Result<Self, QueryError> {
        match len {
            -1 => Ok(Self::Unbounded),
            0 => Ok(Self::CountOnly),
            n if n > 0 => Ok(Self::Bounded(n.unsigned_abs())),
            n => Err(QueryError::InvalidLength(n.to_string())),
        }
    }

    /// Limit to pass to the store's find, or `None` when no find should run.
    #[must_use]
    pub const fn store_limit(self) -> Option<StoreLimit> {
        match self {
            Self::Unbounded => Some(StoreLimit::Unlimited),
            Self::CountOnly => None,
            Self::Bounded(n) => Some(StoreLimit::AtMost(n)),
        }
    }

    /// Signed directive this intent was built from.
    #[must_use]
    pub fn as_len(self) -> i64 {
        match self {
            Self::Unbounded => -1,
            Self::CountOnly => 0,
            Self::Bounded(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl TryFrom<i64> for LengthIntent {
    type Error = QueryError;
    fn try_from(len: i64) -> Result<Self, Self::Error> {
        Self::from_len(len)
    }
}

impl std::fmt::Display for LengthIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::CountOnly => write!(f, "count-only"),
            Self::Bounded(n) => write!(f, "bounded({n})"),
        }
    }
}
